//! Property tests for revision merging and diffing.

use std::collections::BTreeMap;

use proptest::prelude::*;

use ecs_rollout::domain::entities::{ContainerSpec, OverrideSet, TaskDefinitionSpec};
use ecs_rollout::domain::services::{diff, merge};
use ecs_rollout::domain::value_objects::ImageRef;

fn key_values(key: &'static str) -> impl Strategy<Value = BTreeMap<String, String>> {
    let key = proptest::string::string_regex(key).unwrap();
    let value = proptest::string::string_regex("[a-z0-9:/._-]{0,12}").unwrap();
    proptest::collection::btree_map(key, value, 0..4)
}

fn container(index: usize) -> impl Strategy<Value = ContainerSpec> {
    // Upper-case env keys and lower-case secret keys never collide
    (key_values("[A-Z][A-Z_]{0,5}"), key_values("[a-z][a-z_]{0,5}"), 1u8..9).prop_map(
        move |(environment, secrets, version)| {
            let image = format!("repo/app{index}:v{version}");
            let mut spec = ContainerSpec::new(format!("c{index}"), image);
            spec.environment = environment;
            spec.secrets = secrets;
            spec
        },
    )
}

fn definition() -> impl Strategy<Value = TaskDefinitionSpec> {
    (1usize..4)
        .prop_flat_map(|count| (0..count).map(container).collect::<Vec<_>>())
        .prop_map(|containers| {
            let mut spec = TaskDefinitionSpec::new("app", containers);
            spec.revision = Some(7);
            spec.arn = Some("arn:aws:ecs:us-east-1:000000000000:task-definition/app:7".to_string());
            spec
        })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: an empty override set reproduces the base content with no changes.
    #[test]
    fn property_empty_overrides_are_identity(base in definition()) {
        let overrides = OverrideSet::builder().build().unwrap();
        let merged = merge(&base, &overrides).unwrap();

        prop_assert_eq!(&merged, &base.to_draft());
        prop_assert!(merged.revision.is_none());
        prop_assert!(merged.arn.is_none());
        prop_assert!(diff(&base, &merged).is_empty());
    }

    /// PROPERTY: an env upsert touches only the named container.
    #[test]
    fn property_env_upsert_is_scoped(
        base in definition(),
        pick in any::<prop::sample::Index>(),
        key in "[A-Z]{1,6}",
        value in "[a-z0-9]{1,8}",
    ) {
        let target = base.containers[pick.index(base.containers.len())].name.clone();
        let overrides = OverrideSet::builder()
            .env(target.as_str(), key.as_str(), value.as_str())
            .build()
            .unwrap();
        let merged = merge(&base, &overrides).unwrap();

        for (old, new) in base.containers.iter().zip(&merged.containers) {
            prop_assert_eq!(&old.name, &new.name);
            if new.name == target {
                prop_assert_eq!(new.environment.get(&key), Some(&value));
                for (k, v) in &old.environment {
                    if k != &key {
                        prop_assert_eq!(new.environment.get(k), Some(v));
                    }
                }
                prop_assert_eq!(&new.secrets, &old.secrets);
            } else {
                prop_assert_eq!(new, old);
            }
        }
    }

    /// PROPERTY: a tag override retags every image and keeps every repository.
    #[test]
    fn property_tag_override_keeps_repositories(
        base in definition(),
        tag in "[a-z0-9][a-z0-9.]{0,8}",
    ) {
        let overrides = OverrideSet::builder().tag(tag.as_str()).build().unwrap();
        let merged = merge(&base, &overrides).unwrap();

        for (old, new) in base.containers.iter().zip(&merged.containers) {
            let old_image = ImageRef::parse(&old.image);
            let new_image = ImageRef::parse(&new.image);
            prop_assert_eq!(new_image.repository(), old_image.repository());
            prop_assert_eq!(new_image.tag(), Some(tag.as_str()));
        }
    }

    /// PROPERTY: merging a merged revision again with the same overrides changes nothing.
    #[test]
    fn property_merge_is_idempotent(
        base in definition(),
        tag in "[a-z0-9]{1,6}",
        key in "[A-Z]{1,6}",
        value in "[a-z0-9]{1,8}",
    ) {
        let target = base.containers[0].name.clone();
        let overrides = OverrideSet::builder()
            .tag(tag.as_str())
            .env(target.as_str(), key.as_str(), value.as_str())
            .build()
            .unwrap();

        let once = merge(&base, &overrides).unwrap();
        let twice = merge(&once, &overrides).unwrap();

        prop_assert_eq!(&twice, &once);
        prop_assert!(diff(&once, &twice).is_empty());
    }

    /// PROPERTY: exclusive env leaves untouched containers with an empty environment.
    #[test]
    fn property_exclusive_env_empties_untouched_containers(
        base in definition(),
        key in "[A-Z]{1,6}",
    ) {
        let target = base.containers[0].name.clone();
        let overrides = OverrideSet::builder()
            .env(target.as_str(), key.as_str(), "1")
            .exclusive_env(true)
            .build()
            .unwrap();
        let merged = merge(&base, &overrides).unwrap();

        for container in &merged.containers {
            if container.name == target {
                prop_assert_eq!(container.environment.len(), 1);
            } else {
                prop_assert!(container.environment.is_empty());
            }
        }
    }

    /// PROPERTY: merging never mutates the base and is deterministic.
    #[test]
    fn property_merge_is_pure(base in definition(), tag in "[a-z0-9]{1,6}") {
        let snapshot = base.clone();
        let overrides = OverrideSet::builder().tag(tag.as_str()).build().unwrap();

        let first = merge(&base, &overrides).unwrap();
        let second = merge(&base, &overrides).unwrap();

        prop_assert_eq!(&base, &snapshot);
        prop_assert_eq!(first, second);
    }
}
