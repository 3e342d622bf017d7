//! Revision merger
//!
//! Applies an [`OverrideSet`] to a base revision, container by container, in
//! the base's container order:
//! - Image: per-container override wins, else the tag override rewrites the tag
//! - Command: replaced wholesale
//! - Environment / secrets: upserted on the base, or replaced entirely when
//!   exclusive
//! - Roles: replaced if set
//! - Tags: upserted
//!
//! The result is a draft: no revision and no ARN.

use std::collections::BTreeMap;

use crate::domain::entities::{ContainerSpec, KeyUpsert, OverrideSet, TaskDefinitionSpec};
use crate::domain::value_objects::ImageRef;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("unknown container '{name}'")]
    UnknownContainer { name: String },

    #[error("cannot apply a tag to container '{container}': image '{image}' is pinned by digest only")]
    UntaggedImage { container: String, image: String },

    #[error("container '{container}' defines '{key}' as both an environment variable and a secret")]
    NameCollision { container: String, key: String },
}

pub fn merge(
    base: &TaskDefinitionSpec,
    overrides: &OverrideSet,
) -> Result<TaskDefinitionSpec, MergeError> {
    if let Some(name) = overrides
        .referenced_containers()
        .into_iter()
        .find(|name| !base.has_container(name))
    {
        return Err(MergeError::UnknownContainer {
            name: name.to_string(),
        });
    }

    let containers = base
        .containers
        .iter()
        .map(|container| merge_container(container, overrides))
        .collect::<Result<Vec<_>, _>>()?;

    let mut merged = base.to_draft();
    merged.containers = containers;
    if let Some(role) = &overrides.task_role_override {
        merged.task_role_arn = Some(role.clone());
    }
    if let Some(role) = &overrides.execution_role_override {
        merged.execution_role_arn = Some(role.clone());
    }
    for (key, value) in &overrides.tag_upserts {
        merged.tags.insert(key.clone(), value.clone());
    }
    Ok(merged)
}

fn merge_container(
    base: &ContainerSpec,
    overrides: &OverrideSet,
) -> Result<ContainerSpec, MergeError> {
    let mut container = base.clone();

    if let Some(image) = overrides.image_overrides.get(&base.name) {
        container.image = image.clone();
    } else if let Some(tag) = &overrides.tag_override {
        let current = ImageRef::parse(&base.image);
        if current.is_digest_only() {
            return Err(MergeError::UntaggedImage {
                container: base.name.clone(),
                image: base.image.clone(),
            });
        }
        container.image = current.with_tag(tag).to_string();
    }

    if let Some(command) = overrides.command_overrides.get(&base.name) {
        container.command = Some(command.args().to_vec());
    }

    container.environment = apply_upserts(
        &base.name,
        &base.environment,
        &overrides.env_upserts,
        overrides.exclusive_env,
    );
    container.secrets = apply_upserts(
        &base.name,
        &base.secrets,
        &overrides.secret_upserts,
        overrides.exclusive_secrets,
    );

    if let Some(key) = container.colliding_keys().first() {
        return Err(MergeError::NameCollision {
            container: base.name.clone(),
            key: key.to_string(),
        });
    }

    Ok(container)
}

fn apply_upserts(
    container: &str,
    base: &BTreeMap<String, String>,
    upserts: &[KeyUpsert],
    exclusive: bool,
) -> BTreeMap<String, String> {
    let mut values = if exclusive {
        BTreeMap::new()
    } else {
        base.clone()
    };
    for upsert in upserts.iter().filter(|u| u.container == container) {
        values.insert(upsert.key.clone(), upsert.value.clone());
    }
    values
}
