//! Revision diff
//!
//! Lists what a merge changed, in container order, for `--show-diff` and the
//! event stream.

use std::collections::BTreeMap;

use crate::domain::entities::{RevisionChange, TaskDefinitionSpec};

pub fn diff(base: &TaskDefinitionSpec, merged: &TaskDefinitionSpec) -> Vec<RevisionChange> {
    let mut changes = Vec::new();

    for new in &merged.containers {
        let Some(old) = base.container(&new.name) else {
            continue;
        };
        if old.image != new.image {
            changes.push(RevisionChange::Image {
                container: new.name.clone(),
                old: old.image.clone(),
                new: new.image.clone(),
            });
        }
        if old.command != new.command {
            changes.push(RevisionChange::Command {
                container: new.name.clone(),
                old: old.command.clone(),
                new: new.command.clone(),
            });
        }
        for (key, value) in changed_entries(&old.environment, &new.environment) {
            changes.push(RevisionChange::EnvironmentSet {
                container: new.name.clone(),
                key: key.to_string(),
                value: value.to_string(),
            });
        }
        for key in removed_keys(&old.environment, &new.environment) {
            changes.push(RevisionChange::EnvironmentRemoved {
                container: new.name.clone(),
                key: key.to_string(),
            });
        }
        for (key, value_from) in changed_entries(&old.secrets, &new.secrets) {
            changes.push(RevisionChange::SecretSet {
                container: new.name.clone(),
                key: key.to_string(),
                value_from: value_from.to_string(),
            });
        }
        for key in removed_keys(&old.secrets, &new.secrets) {
            changes.push(RevisionChange::SecretRemoved {
                container: new.name.clone(),
                key: key.to_string(),
            });
        }
    }

    if base.task_role_arn != merged.task_role_arn {
        changes.push(RevisionChange::TaskRole {
            old: base.task_role_arn.clone(),
            new: merged.task_role_arn.clone(),
        });
    }
    if base.execution_role_arn != merged.execution_role_arn {
        changes.push(RevisionChange::ExecutionRole {
            old: base.execution_role_arn.clone(),
            new: merged.execution_role_arn.clone(),
        });
    }
    for (key, value) in changed_entries(&base.tags, &merged.tags) {
        changes.push(RevisionChange::Tag {
            key: key.to_string(),
            old: base.tags.get(key).cloned(),
            new: value.to_string(),
        });
    }

    changes
}

fn changed_entries<'a>(
    old: &'a BTreeMap<String, String>,
    new: &'a BTreeMap<String, String>,
) -> impl Iterator<Item = (&'a str, &'a str)> {
    new.iter()
        .filter(move |(key, value)| old.get(*key) != Some(*value))
        .map(|(key, value)| (key.as_str(), value.as_str()))
}

fn removed_keys<'a>(
    old: &'a BTreeMap<String, String>,
    new: &'a BTreeMap<String, String>,
) -> impl Iterator<Item = &'a str> {
    old.keys()
        .filter(move |key| !new.contains_key(*key))
        .map(String::as_str)
}
