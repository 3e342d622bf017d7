//! Override set entity
//!
//! The typed bundle of requested changes. Built through
//! [`OverrideSetBuilder`], which performs every check that does not need the
//! base revision; container existence and collisions are checked by the merger.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::value_objects::{ParsedCommand, TaskRef};
use crate::error::ValidationError;

/// One `(container, key, value)` upsert for environment or secrets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyUpsert {
    pub container: String,
    pub key: String,
    pub value: String,
}

impl KeyUpsert {
    pub fn new(
        container: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Requested changes to a task definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideSet {
    /// Per-container image replacement; wins over `tag_override`
    pub image_overrides: BTreeMap<String, String>,
    /// New tag for every container image
    pub tag_override: Option<String>,
    /// Applied in order; later entries for the same key win
    pub env_upserts: Vec<KeyUpsert>,
    /// Resulting environments contain only this invocation's upserts
    pub exclusive_env: bool,
    pub secret_upserts: Vec<KeyUpsert>,
    pub exclusive_secrets: bool,
    pub command_overrides: BTreeMap<String, ParsedCommand>,
    pub task_role_override: Option<String>,
    pub execution_role_override: Option<String>,
    /// Task definition tags, applied in order
    pub tag_upserts: Vec<(String, String)>,
    /// Branch from this definition instead of the service's current one
    pub source_task_ref: Option<TaskRef>,
}

impl OverrideSet {
    pub fn builder() -> OverrideSetBuilder {
        OverrideSetBuilder::default()
    }

    /// True when applying this set would change nothing.
    pub fn is_empty(&self) -> bool {
        self.image_overrides.is_empty()
            && self.tag_override.is_none()
            && self.env_upserts.is_empty()
            && !self.exclusive_env
            && self.secret_upserts.is_empty()
            && !self.exclusive_secrets
            && self.command_overrides.is_empty()
            && self.task_role_override.is_none()
            && self.execution_role_override.is_none()
            && self.tag_upserts.is_empty()
    }

    /// Every container name any override points at.
    pub fn referenced_containers(&self) -> BTreeSet<&str> {
        self.image_overrides
            .keys()
            .map(String::as_str)
            .chain(self.command_overrides.keys().map(String::as_str))
            .chain(self.env_upserts.iter().map(|u| u.container.as_str()))
            .chain(self.secret_upserts.iter().map(|u| u.container.as_str()))
            .collect()
    }

    /// Whether the set changes anything a run-task container override cannot express.
    pub fn unsupported_as_container_override(&self) -> Option<&'static str> {
        if !self.image_overrides.is_empty() || self.tag_override.is_some() {
            Some("an image change")
        } else if self.task_role_override.is_some() || self.execution_role_override.is_some() {
            Some("a role change")
        } else if self.exclusive_env || self.exclusive_secrets {
            Some("exclusive environment or secrets")
        } else if !self.tag_upserts.is_empty() {
            Some("a task definition tag")
        } else {
            None
        }
    }
}

/// Collects raw override input and validates it into an [`OverrideSet`].
#[derive(Debug, Default)]
pub struct OverrideSetBuilder {
    images: Vec<(String, String)>,
    tag: Option<String>,
    env: Vec<KeyUpsert>,
    exclusive_env: bool,
    secrets: Vec<KeyUpsert>,
    exclusive_secrets: bool,
    commands: Vec<(String, String)>,
    task_role: Option<String>,
    execution_role: Option<String>,
    task_tags: Vec<(String, String)>,
    source_task: Option<TaskRef>,
}

impl OverrideSetBuilder {
    pub fn image(mut self, container: impl Into<String>, image: impl Into<String>) -> Self {
        self.images.push((container.into(), image.into()));
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn env(
        mut self,
        container: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.env.push(KeyUpsert::new(container, key, value));
        self
    }

    /// Upserts that come before any explicit `env` calls (env files).
    pub fn env_defaults(mut self, upserts: Vec<KeyUpsert>) -> Self {
        let explicit = std::mem::take(&mut self.env);
        self.env = upserts;
        self.env.extend(explicit);
        self
    }

    pub fn exclusive_env(mut self, exclusive: bool) -> Self {
        self.exclusive_env = exclusive;
        self
    }

    pub fn secret(
        mut self,
        container: impl Into<String>,
        key: impl Into<String>,
        value_from: impl Into<String>,
    ) -> Self {
        self.secrets.push(KeyUpsert::new(container, key, value_from));
        self
    }

    pub fn exclusive_secrets(mut self, exclusive: bool) -> Self {
        self.exclusive_secrets = exclusive;
        self
    }

    pub fn command(mut self, container: impl Into<String>, raw: impl Into<String>) -> Self {
        self.commands.push((container.into(), raw.into()));
        self
    }

    pub fn task_role(mut self, arn: impl Into<String>) -> Self {
        self.task_role = Some(arn.into());
        self
    }

    pub fn execution_role(mut self, arn: impl Into<String>) -> Self {
        self.execution_role = Some(arn.into());
        self
    }

    pub fn task_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.task_tags.push((key.into(), value.into()));
        self
    }

    pub fn source_task(mut self, task: TaskRef) -> Self {
        self.source_task = Some(task);
        self
    }

    pub fn build(self) -> Result<OverrideSet, ValidationError> {
        let tag_override = match self.tag {
            Some(tag) if tag.trim().is_empty() => return Err(ValidationError::EmptyTag),
            Some(tag) => Some(tag.trim().to_string()),
            None => None,
        };

        let mut image_overrides: BTreeMap<String, String> = BTreeMap::new();
        for (container, image) in self.images {
            let image = image.trim().to_string();
            if image.is_empty() {
                return Err(ValidationError::InvalidImage {
                    container,
                    image,
                    message: "image must not be empty".to_string(),
                });
            }
            if let Some(first) = image_overrides.get(&container) {
                if *first != image {
                    return Err(ValidationError::ConflictingImageOverride {
                        container,
                        first: first.clone(),
                        second: image,
                    });
                }
            }
            image_overrides.insert(container, image);
        }

        let mut command_overrides: BTreeMap<String, ParsedCommand> = BTreeMap::new();
        for (container, raw) in self.commands {
            let parsed = ParsedCommand::parse(&raw).map_err(|message| {
                ValidationError::InvalidCommand {
                    container: container.clone(),
                    message,
                }
            })?;
            if let Some(existing) = command_overrides.get(&container) {
                if *existing != parsed {
                    return Err(ValidationError::InvalidCommand {
                        container,
                        message: "command given more than once with different values".to_string(),
                    });
                }
            }
            command_overrides.insert(container, parsed);
        }

        Ok(OverrideSet {
            image_overrides,
            tag_override,
            env_upserts: self.env,
            exclusive_env: self.exclusive_env,
            secret_upserts: self.secrets,
            exclusive_secrets: self.exclusive_secrets,
            command_overrides,
            task_role_override: role_arn("task role", self.task_role)?,
            execution_role_override: role_arn("execution role", self.execution_role)?,
            tag_upserts: self.task_tags,
            source_task_ref: self.source_task,
        })
    }
}

fn role_arn(which: &'static str, value: Option<String>) -> Result<Option<String>, ValidationError> {
    match value.map(|v| v.trim().to_string()) {
        Some(arn) if arn.is_empty() => Err(ValidationError::EmptyRole { which }),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_gives_empty_set() {
        let set = OverrideSet::builder().build().unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn blank_tag_is_rejected() {
        let err = OverrideSet::builder().tag("  ").build().unwrap_err();
        assert_eq!(err, ValidationError::EmptyTag);
    }

    #[test]
    fn blank_roles_are_rejected() {
        let err = OverrideSet::builder().task_role("").build().unwrap_err();
        assert_eq!(err, ValidationError::EmptyRole { which: "task role" });

        let err = OverrideSet::builder()
            .execution_role(" ")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::EmptyRole {
                which: "execution role"
            }
        );
    }

    #[test]
    fn tag_is_trimmed() {
        let set = OverrideSet::builder().tag(" 1.2.3 ").build().unwrap();
        assert_eq!(set.tag_override.as_deref(), Some("1.2.3"));
    }

    #[test]
    fn conflicting_image_overrides_are_rejected() {
        let err = OverrideSet::builder()
            .image("web", "web:1")
            .image("web", "web:2")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::ConflictingImageOverride { ref container, .. } if container == "web"
        ));
    }

    #[test]
    fn repeated_identical_image_override_is_fine() {
        let set = OverrideSet::builder()
            .image("web", "web:1")
            .image("web", "web:1")
            .build()
            .unwrap();
        assert_eq!(set.image_overrides.len(), 1);
    }

    #[test]
    fn image_and_tag_may_be_combined() {
        let set = OverrideSet::builder()
            .tag("1.2.3")
            .image("web", "web:9.9")
            .build()
            .unwrap();
        assert_eq!(set.image_overrides["web"], "web:9.9");
        assert_eq!(set.tag_override.as_deref(), Some("1.2.3"));
    }

    #[test]
    fn command_is_parsed_once() {
        let set = OverrideSet::builder()
            .command("web", r#"["npm", "start"]"#)
            .build()
            .unwrap();
        assert_eq!(
            set.command_overrides["web"],
            ParsedCommand::JsonArray(vec!["npm".to_string(), "start".to_string()])
        );
    }

    #[test]
    fn invalid_command_names_container() {
        // No closing bracket, so this is split as shell tokens.
        let unclosed = OverrideSet::builder().command("worker", "[not json").build();
        assert!(unclosed.is_ok());

        let err = OverrideSet::builder()
            .command("worker", "[not, json]")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidCommand { ref container, .. } if container == "worker"
        ));
    }

    #[test]
    fn env_defaults_come_before_explicit_upserts() {
        let set = OverrideSet::builder()
            .env("web", "A", "explicit")
            .env_defaults(vec![KeyUpsert::new("web", "A", "from-file")])
            .build()
            .unwrap();
        let values: Vec<_> = set.env_upserts.iter().map(|u| u.value.as_str()).collect();
        assert_eq!(values, ["from-file", "explicit"]);
    }

    #[test]
    fn blank_roles_are_ignored() {
        let set = OverrideSet::builder().task_role("").build().unwrap();
        assert!(set.task_role_override.is_none());
    }

    #[test]
    fn referenced_containers_cover_every_override_kind() {
        let set = OverrideSet::builder()
            .image("a", "a:1")
            .command("b", "run")
            .env("c", "K", "V")
            .secret("d", "S", "arn")
            .build()
            .unwrap();
        let names: Vec<_> = set.referenced_containers().into_iter().collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
    }

    #[test]
    fn run_override_support() {
        let env_only = OverrideSet::builder().env("web", "A", "1").build().unwrap();
        assert!(env_only.unsupported_as_container_override().is_none());

        let with_tag = OverrideSet::builder().tag("2").build().unwrap();
        assert_eq!(
            with_tag.unsupported_as_container_override(),
            Some("an image change")
        );
    }
}
