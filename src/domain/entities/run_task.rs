//! One-off task launch request and results

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::LaunchType;

use super::task_definition::NetworkConfiguration;

/// Per-container overrides sent with a run-task call.
///
/// `environment` and `secrets` carry the full merged maps, not just the
/// changed keys.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerOverride {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<BTreeMap<String, String>>,
}

impl ContainerOverride {
    pub fn is_empty(&self) -> bool {
        self.command.is_none() && self.environment.is_none() && self.secrets.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTaskRequest {
    pub cluster: String,
    /// ARN or `family:revision`
    pub task_definition: String,
    pub count: u32,
    pub started_by: Option<String>,
    pub launch_type: LaunchType,
    pub network_configuration: Option<NetworkConfiguration>,
    pub platform_version: Option<String>,
    pub container_overrides: Vec<ContainerOverride>,
}

/// Result for one requested task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskLaunch {
    Started { task_arn: String },
    Failed { arn: Option<String>, reason: String },
}

impl TaskLaunch {
    pub fn is_started(&self) -> bool {
        matches!(self, TaskLaunch::Started { .. })
    }
}
