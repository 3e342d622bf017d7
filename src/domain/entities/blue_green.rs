//! Blue/green deployment entities

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle states of a blue/green deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlueGreenState {
    Created,
    Queued,
    InProgress,
    Ready,
    Succeeded,
    Failed,
    Stopped,
}

impl BlueGreenState {
    /// Map the service's status string. `Baking` counts as in progress.
    pub fn from_api(status: &str) -> Option<Self> {
        match status {
            "Created" => Some(BlueGreenState::Created),
            "Queued" => Some(BlueGreenState::Queued),
            "InProgress" | "Baking" => Some(BlueGreenState::InProgress),
            "Ready" => Some(BlueGreenState::Ready),
            "Succeeded" => Some(BlueGreenState::Succeeded),
            "Failed" => Some(BlueGreenState::Failed),
            "Stopped" => Some(BlueGreenState::Stopped),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BlueGreenState::Succeeded | BlueGreenState::Failed | BlueGreenState::Stopped
        )
    }
}

impl fmt::Display for BlueGreenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BlueGreenState::Created => "Created",
            BlueGreenState::Queued => "Queued",
            BlueGreenState::InProgress => "InProgress",
            BlueGreenState::Ready => "Ready",
            BlueGreenState::Succeeded => "Succeeded",
            BlueGreenState::Failed => "Failed",
            BlueGreenState::Stopped => "Stopped",
        };
        f.write_str(s)
    }
}

/// Status of one blue/green deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlueGreenStatus {
    pub deployment_id: String,
    pub state: BlueGreenState,
    pub error_message: Option<String>,
}

/// The service a deployment group shifts traffic for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentGroupInfo {
    pub application: String,
    pub deployment_group: String,
    pub cluster: String,
    pub service: String,
    /// Container receiving load balancer traffic
    #[serde(default)]
    pub container_name: Option<String>,
    #[serde(default)]
    pub container_port: Option<u16>,
}
