//! Service snapshot entity
//!
//! What the monitor reads back from the registry on each poll.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A service event message, e.g. placement or health-check notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEvent {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub message: String,
}

/// A task currently known to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub arn: String,
    pub task_definition_arn: String,
    pub last_status: String,
}

impl TaskSummary {
    pub fn is_running(&self) -> bool {
        self.last_status.eq_ignore_ascii_case("RUNNING")
    }
}

/// One rollout tracked by the service (`PRIMARY` is the newest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDeployment {
    pub id: String,
    pub status: String,
    pub task_definition_arn: String,
    pub desired_count: u32,
    pub running_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ServiceDeployment {
    pub fn is_primary(&self) -> bool {
        self.status.eq_ignore_ascii_case("PRIMARY")
    }
}

/// Point-in-time description of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSnapshot {
    pub cluster: String,
    pub service_name: String,
    /// The revision the service is configured to run
    pub task_definition_arn: String,
    pub desired_count: u32,
    pub running_count: u32,
    #[serde(default)]
    pub pending_count: u32,
    #[serde(default)]
    pub deployments: Vec<ServiceDeployment>,
    #[serde(default)]
    pub tasks: Vec<TaskSummary>,
    /// Newest first or oldest first; consumers must not rely on order
    #[serde(default)]
    pub events: Vec<ServiceEvent>,
}

impl ServiceSnapshot {
    pub fn primary_deployment(&self) -> Option<&ServiceDeployment> {
        self.deployments.iter().find(|d| d.is_primary())
    }

    /// Running tasks whose revision is `task_definition_arn`.
    pub fn running_on(&self, task_definition_arn: &str) -> u32 {
        self.tasks
            .iter()
            .filter(|t| t.is_running() && t.task_definition_arn == task_definition_arn)
            .count() as u32
    }

    /// Steady state on `target`: the service points at it, no older rollout
    /// remains, every running task uses it, and the running count matches.
    ///
    /// A matching count on a stale revision is not convergence.
    pub fn is_converged_on(&self, target: &str) -> bool {
        if self.task_definition_arn != target || self.deployments.len() > 1 {
            return false;
        }
        let stale_running = self
            .tasks
            .iter()
            .any(|t| t.is_running() && t.task_definition_arn != target);
        if stale_running {
            return false;
        }
        self.running_count == self.desired_count && self.running_on(target) == self.desired_count
    }
}
