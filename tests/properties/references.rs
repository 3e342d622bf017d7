//! Property tests for task and image reference parsing.

use proptest::prelude::*;

use ecs_rollout::domain::value_objects::{ImageRef, ParsedCommand, TaskRef};

fn family() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9_-]{1,32}").unwrap()
}

fn repository() -> impl Strategy<Value = String> {
    let host = prop_oneof![
        Just(String::new()),
        Just("registry.example.com/".to_string()),
        Just("localhost:5000/".to_string()),
    ];
    let name = proptest::string::string_regex("[a-z0-9]{1,12}(/[a-z0-9]{1,12}){0,2}").unwrap();
    (host, name).prop_map(|(host, name)| format!("{host}{name}"))
}

fn tag() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9_][A-Za-z0-9_.-]{0,20}").unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: parsing arbitrary input never panics.
    #[test]
    fn property_task_ref_parse_never_panics(input in ".{0,64}") {
        let _ = TaskRef::parse(&input);
        let _ = ImageRef::parse(&input);
        let _ = ParsedCommand::parse(&input);
    }

    /// PROPERTY: `family:revision` keeps both parts and prints back the same text.
    #[test]
    fn property_family_revision_is_exact(family in family(), revision in 1u32..100_000) {
        let input = format!("{family}:{revision}");
        let parsed = TaskRef::parse(&input).unwrap();
        prop_assert_eq!(parsed.family(), Some(family.as_str()));
        prop_assert_eq!(parsed.revision(), Some(revision));
        prop_assert_eq!(parsed.to_string(), input);
    }

    /// PROPERTY: revision zero is never accepted, whatever the family.
    #[test]
    fn property_revision_zero_is_rejected(family in family()) {
        let input = format!("{family}:0");
        prop_assert!(TaskRef::parse(&input).is_err());
    }

    /// PROPERTY: a task-definition ARN is kept verbatim and its parts are readable.
    #[test]
    fn property_arn_is_preserved(family in family(), revision in 1u32..10_000) {
        let arn =
            format!("arn:aws:ecs:eu-west-1:123456789012:task-definition/{family}:{revision}");
        let parsed = TaskRef::parse(&arn).unwrap();
        prop_assert_eq!(&parsed, &TaskRef::Arn(arn.clone()));
        prop_assert_eq!(parsed.family(), Some(family.as_str()));
        prop_assert_eq!(parsed.revision(), Some(revision));
    }

    /// PROPERTY: retagging replaces only the tag; a registry port is never mistaken for one.
    #[test]
    fn property_retag_keeps_repository(
        repo in repository(),
        old in proptest::option::of(tag()),
        new in tag(),
    ) {
        let image = match &old {
            Some(old) => format!("{repo}:{old}"),
            None => repo.clone(),
        };
        let parsed = ImageRef::parse(&image);
        prop_assert_eq!(parsed.repository(), repo.as_str());
        prop_assert_eq!(parsed.tag(), old.as_deref());

        let retagged = parsed.with_tag(&new);
        prop_assert_eq!(retagged.to_string(), format!("{repo}:{new}"));
    }
}
