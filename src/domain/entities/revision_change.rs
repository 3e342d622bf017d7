//! A single difference between a base revision and its merged successor

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionChange {
    Image {
        container: String,
        old: String,
        new: String,
    },
    Command {
        container: String,
        old: Option<Vec<String>>,
        new: Option<Vec<String>>,
    },
    EnvironmentSet {
        container: String,
        key: String,
        value: String,
    },
    EnvironmentRemoved {
        container: String,
        key: String,
    },
    SecretSet {
        container: String,
        key: String,
        value_from: String,
    },
    SecretRemoved {
        container: String,
        key: String,
    },
    TaskRole {
        old: Option<String>,
        new: Option<String>,
    },
    ExecutionRole {
        old: Option<String>,
        new: Option<String>,
    },
    Tag {
        key: String,
        old: Option<String>,
        new: String,
    },
}

impl RevisionChange {
    /// Container this change applies to, `None` for task-level changes.
    pub fn container(&self) -> Option<&str> {
        match self {
            RevisionChange::Image { container, .. }
            | RevisionChange::Command { container, .. }
            | RevisionChange::EnvironmentSet { container, .. }
            | RevisionChange::EnvironmentRemoved { container, .. }
            | RevisionChange::SecretSet { container, .. }
            | RevisionChange::SecretRemoved { container, .. } => Some(container),
            RevisionChange::TaskRole { .. }
            | RevisionChange::ExecutionRole { .. }
            | RevisionChange::Tag { .. } => None,
        }
    }
}

fn command_text(command: &Option<Vec<String>>) -> String {
    command.as_ref().map(|args| args.join(" ")).unwrap_or_default()
}

impl fmt::Display for RevisionChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevisionChange::Image { container, old, new } => write!(
                f,
                "Changed image of container \"{container}\" to: \"{new}\" (was: \"{old}\")"
            ),
            RevisionChange::Command { container, old, new } => write!(
                f,
                "Changed command of container \"{container}\" to: \"{}\" (was: \"{}\")",
                command_text(new),
                command_text(old)
            ),
            RevisionChange::EnvironmentSet {
                container,
                key,
                value,
            } => write!(
                f,
                "Changed environment \"{key}\" of container \"{container}\" to: \"{value}\""
            ),
            RevisionChange::EnvironmentRemoved { container, key } => {
                write!(f, "Removed environment \"{key}\" of container \"{container}\"")
            }
            RevisionChange::SecretSet {
                container,
                key,
                value_from,
            } => write!(
                f,
                "Changed secret \"{key}\" of container \"{container}\" to: \"{value_from}\""
            ),
            RevisionChange::SecretRemoved { container, key } => {
                write!(f, "Removed secret \"{key}\" of container \"{container}\"")
            }
            RevisionChange::TaskRole { old, new } => write!(
                f,
                "Changed role_arn to: \"{}\" (was: \"{}\")",
                new.as_deref().unwrap_or_default(),
                old.as_deref().unwrap_or_default()
            ),
            RevisionChange::ExecutionRole { old, new } => write!(
                f,
                "Changed execution_role_arn to: \"{}\" (was: \"{}\")",
                new.as_deref().unwrap_or_default(),
                old.as_deref().unwrap_or_default()
            ),
            RevisionChange::Tag { key, old, new } => match old {
                Some(old) => write!(f, "Changed tags['{key}'] to: \"{new}\" (was: \"{old}\")"),
                None => write!(f, "Changed tags['{key}'] to: \"{new}\""),
            },
        }
    }
}
