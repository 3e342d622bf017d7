//! Application Layer
//!
//! Use cases that orchestrate the rollout flow.
//! This layer:
//! - Depends on Domain layer (entities, services, ports)
//! - Does NOT contain business rules (those are in Domain)
//! - Receives every dependency through a [`RolloutContext`]
//!
//! ## Use Cases
//!
//! - `DeployUseCase` - merge, register, update service, watch
//! - `ScaleUseCase` - change desired count, watch
//! - `RunUseCase` - start one-off tasks
//! - `UpdateUseCase` - register a revision only
//! - `CronUseCase` - register and retarget a scheduled rule
//! - `CodeDeployUseCase` - register and hand off to a blue/green deployment

pub mod code_deploy;
pub mod context;
pub mod cron;
pub mod deploy;
pub mod revision;
pub mod run;
pub mod scale;
pub mod update;

#[cfg(test)]
pub(crate) mod test_support;

pub use code_deploy::{CodeDeployOptions, CodeDeployResult, CodeDeployUseCase};
pub use context::RolloutContext;
pub use cron::{CronOptions, CronResult, CronUseCase};
pub use deploy::{DeployOptions, DeployResult, DeployUseCase};
pub use revision::{deregister, select_base, RevisionPlan};
pub use run::{RunOptions, RunResult, RunUseCase};
pub use scale::{ScaleOptions, ScaleResult, ScaleUseCase};
pub use update::{UpdateOptions, UpdateResult, UpdateUseCase};
