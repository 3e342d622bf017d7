//! Task definition entity
//!
//! An immutable snapshot of one task definition revision. Merges never mutate
//! a snapshot in place; they build a new value without revision or ARN, and
//! only the registry hands out those identifiers.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Attributes the core does not interpret, carried through merges verbatim.
pub type ExtraAttributes = BTreeMap<String, serde_json::Value>;

/// One container within a task definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    /// Immutable key within the task definition
    pub name: String,
    /// `repository[:tag]` or digest form
    pub image: String,
    /// `None` inherits the image entrypoint default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    /// Name → `valueFrom` reference (ARN or parameter key)
    #[serde(default)]
    pub secrets: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_attributes: ExtraAttributes,
}

impl ContainerSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            command: None,
            environment: BTreeMap::new(),
            secrets: BTreeMap::new(),
            extra_attributes: BTreeMap::new(),
        }
    }

    pub fn with_command(mut self, command: Vec<String>) -> Self {
        self.command = Some(command);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn with_secret(mut self, key: impl Into<String>, value_from: impl Into<String>) -> Self {
        self.secrets.insert(key.into(), value_from.into());
        self
    }

    /// Keys present in both environment and secrets.
    pub fn colliding_keys(&self) -> Vec<&str> {
        self.environment
            .keys()
            .filter(|key| self.secrets.contains_key(*key))
            .map(String::as_str)
            .collect()
    }
}

/// awsvpc network configuration for Fargate-class launches.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfiguration {
    #[serde(default)]
    pub subnets: BTreeSet<String>,
    #[serde(default)]
    pub security_groups: BTreeSet<String>,
    #[serde(default)]
    pub assign_public_ip: bool,
}

impl NetworkConfiguration {
    /// At least one subnet and one security group.
    pub fn is_complete(&self) -> bool {
        !self.subnets.is_empty() && !self.security_groups.is_empty()
    }
}

/// Identity of a registered revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevisionId {
    pub family: String,
    pub revision: u32,
    pub arn: String,
}

impl RevisionId {
    /// `family:revision` form, as accepted by the registry.
    pub fn family_revision(&self) -> String {
        format!("{}:{}", self.family, self.revision)
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.family, self.revision)
    }
}

/// Resource-tag condition: the tag `key` must hold one of `values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    pub key: String,
    pub values: Vec<String>,
}

impl TagFilter {
    pub fn new(key: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            key: key.into(),
            values,
        }
    }

    pub fn matches(&self, tags: &BTreeMap<String, String>) -> bool {
        tags.get(&self.key).is_some_and(|v| self.values.contains(v))
    }
}

/// Snapshot of a task definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinitionSpec {
    pub family: String,
    /// Registry-assigned, `None` for a draft
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
    /// Registry-assigned, `None` for a draft
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    /// Order is significant and preserved across merges
    pub containers: Vec<ContainerSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires_compatibilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_configuration: Option<NetworkConfiguration>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_attributes: ExtraAttributes,
}

impl TaskDefinitionSpec {
    pub fn new(family: impl Into<String>, containers: Vec<ContainerSpec>) -> Self {
        Self {
            family: family.into(),
            revision: None,
            arn: None,
            containers,
            task_role_arn: None,
            execution_role_arn: None,
            network_mode: None,
            requires_compatibilities: Vec::new(),
            cpu: None,
            memory: None,
            network_configuration: None,
            tags: BTreeMap::new(),
            extra_attributes: BTreeMap::new(),
        }
    }

    pub fn with_task_role(mut self, arn: impl Into<String>) -> Self {
        self.task_role_arn = Some(arn.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_network_configuration(mut self, network: NetworkConfiguration) -> Self {
        self.network_configuration = Some(network);
        self
    }

    pub fn container(&self, name: &str) -> Option<&ContainerSpec> {
        self.containers.iter().find(|c| c.name == name)
    }

    pub fn has_container(&self, name: &str) -> bool {
        self.container(name).is_some()
    }

    pub fn container_names(&self) -> impl Iterator<Item = &str> {
        self.containers.iter().map(|c| c.name.as_str())
    }

    /// Identity of this snapshot if it came from the registry.
    pub fn revision_id(&self) -> Option<RevisionId> {
        match (self.revision, &self.arn) {
            (Some(revision), Some(arn)) => Some(RevisionId {
                family: self.family.clone(),
                revision,
                arn: arn.clone(),
            }),
            _ => None,
        }
    }

    /// Copy without registry-assigned identity.
    pub fn to_draft(&self) -> Self {
        Self {
            revision: None,
            arn: None,
            ..self.clone()
        }
    }

    /// Content-level equality, ignoring revision numbers and ARNs.
    pub fn same_content(&self, other: &Self) -> bool {
        self.to_draft() == other.to_draft()
    }

    pub fn has_unique_container_names(&self) -> bool {
        let mut seen = BTreeSet::new();
        self.containers.iter().all(|c| seen.insert(c.name.as_str()))
    }

    /// Whether the definition declares Fargate compatibility.
    pub fn requires_fargate(&self) -> bool {
        self.requires_compatibilities
            .iter()
            .any(|c| c.eq_ignore_ascii_case("FARGATE"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> TaskDefinitionSpec {
        TaskDefinitionSpec::new(
            "web",
            vec![
                ContainerSpec::new("web", "web:1.0").with_env("A", "1"),
                ContainerSpec::new("app", "app:2.0"),
            ],
        )
    }

    #[test]
    fn container_lookup_by_name() {
        let spec = spec();
        assert_eq!(spec.container("app").unwrap().image, "app:2.0");
        assert!(spec.container("missing").is_none());
        assert_eq!(spec.container_names().collect::<Vec<_>>(), ["web", "app"]);
    }

    #[test]
    fn draft_drops_identity() {
        let mut registered = spec();
        registered.revision = Some(4);
        registered.arn = Some("arn:aws:ecs:r:1:task-definition/web:4".to_string());

        let id = registered.revision_id().unwrap();
        assert_eq!(id.to_string(), "web:4");

        let draft = registered.to_draft();
        assert!(draft.revision_id().is_none());
        assert!(draft.same_content(&registered));
    }

    #[test]
    fn detects_duplicate_container_names() {
        let mut spec = spec();
        assert!(spec.has_unique_container_names());
        spec.containers.push(ContainerSpec::new("web", "other:1"));
        assert!(!spec.has_unique_container_names());
    }

    #[test]
    fn colliding_keys_between_env_and_secrets() {
        let container = ContainerSpec::new("web", "web:1")
            .with_env("TOKEN", "plain")
            .with_secret("TOKEN", "arn:secret");
        assert_eq!(container.colliding_keys(), ["TOKEN"]);
    }

    #[test]
    fn serializes_camel_case_and_skips_empty_fields() {
        let json = serde_json::to_value(spec()).unwrap();
        assert!(json.get("taskRoleArn").is_none());
        assert_eq!(json["containers"][0]["environment"]["A"], "1");
    }
}
