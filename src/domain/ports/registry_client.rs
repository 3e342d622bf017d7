//! RegistryClient port
//!
//! Every call the rollout engine makes against the container service, the
//! scheduled-event rules and the blue/green deployment service. Adapters
//! translate these into wire requests (or a local state file).

use crate::domain::entities::{
    BlueGreenStatus, DeploymentGroupInfo, RevisionId, RunTaskRequest, ServiceSnapshot, TagFilter,
    TaskDefinitionSpec, TaskLaunch,
};
use crate::domain::value_objects::TaskRef;

pub type RegistryResult<T> = Result<T, RegistryError>;

pub trait RegistryClient: Send + Sync {
    /// Fetch a revision. A bare family resolves to its latest active revision.
    fn describe_task_definition(&self, task: &TaskRef) -> RegistryResult<TaskDefinitionSpec>;

    /// Register `spec` as the next revision of its family.
    fn register_task_definition(&self, spec: &TaskDefinitionSpec) -> RegistryResult<RevisionId>;

    fn deregister_task_definition(&self, revision: &RevisionId) -> RegistryResult<()>;

    /// ARNs of every revision whose resource tags satisfy all `filters`,
    /// in no particular order.
    fn find_task_definitions(&self, filters: &[TagFilter]) -> RegistryResult<Vec<String>>;

    /// Point the service at `revision` and/or change its desired count.
    fn update_service(
        &self,
        cluster: &str,
        service: &str,
        revision: Option<&RevisionId>,
        desired_count: Option<u32>,
    ) -> RegistryResult<()>;

    fn describe_service(&self, cluster: &str, service: &str) -> RegistryResult<ServiceSnapshot>;

    /// One entry per requested task, started or failed.
    fn run_task(&self, request: &RunTaskRequest) -> RegistryResult<Vec<TaskLaunch>>;

    /// Retarget a scheduled rule at `revision`. Returns the target id.
    fn update_scheduled_rule_target(
        &self,
        cluster: &str,
        rule: &str,
        revision: &RevisionId,
    ) -> RegistryResult<String>;

    fn describe_deployment_group(
        &self,
        application: &str,
        deployment_group: &str,
    ) -> RegistryResult<DeploymentGroupInfo>;

    /// Start a blue/green deployment. Returns the deployment id.
    fn create_deployment(
        &self,
        group: &DeploymentGroupInfo,
        revision: &RevisionId,
    ) -> RegistryResult<String>;

    fn describe_deployment(&self, deployment_id: &str) -> RegistryResult<BlueGreenStatus>;
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("not found: {resource}")]
    NotFound { resource: String },

    #[error("{operation} rejected: {message}")]
    Rejected { operation: String, message: String },

    #[error("request throttled: {message}")]
    Throttled { message: String },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("unexpected response from {operation}: {message}")]
    Protocol { operation: String, message: String },

    #[error("registry state error: {message}")]
    Storage { message: String },
}

impl RegistryError {
    /// Worth retrying while polling.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RegistryError::Throttled { .. } | RegistryError::Transport { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_throttling_and_transport_are_transient() {
        assert!(RegistryError::Throttled {
            message: "slow down".into()
        }
        .is_transient());
        assert!(RegistryError::Transport {
            message: "reset".into()
        }
        .is_transient());
        assert!(!RegistryError::NotFound {
            resource: "service web".into()
        }
        .is_transient());
        assert!(!RegistryError::Rejected {
            operation: "UpdateService".into(),
            message: "bad".into()
        }
        .is_transient());
    }
}
