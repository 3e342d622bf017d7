//! Domain Entities
//!
//! - `TaskDefinitionSpec` / `ContainerSpec` - immutable revision snapshots
//! - `OverrideSet` - validated bundle of requested changes
//! - `ServiceSnapshot` - what a poll reads back from a service
//! - `BlueGreenStatus` / `DeploymentGroupInfo` - blue/green deployments
//! - `RunTaskRequest` / `TaskLaunch` - one-off task launches
//! - `RevisionChange` - one line of a revision diff
//! - `DeploymentOutcome` - terminal monitor result

mod blue_green;
mod outcome;
mod override_set;
mod revision_change;
mod run_task;
mod service;
mod task_definition;

pub use blue_green::{BlueGreenState, BlueGreenStatus, DeploymentGroupInfo};
pub use outcome::DeploymentOutcome;
pub use override_set::{KeyUpsert, OverrideSet, OverrideSetBuilder};
pub use revision_change::RevisionChange;
pub use run_task::{ContainerOverride, RunTaskRequest, TaskLaunch};
pub use service::{ServiceDeployment, ServiceEvent, ServiceSnapshot, TaskSummary};
pub use task_definition::{
    ContainerSpec, ExtraAttributes, NetworkConfiguration, RevisionId, TagFilter,
    TaskDefinitionSpec,
};
