//! ecs-rollout - task definition revisions and service rollouts
//!
//! Merges typed overrides onto an existing task definition revision,
//! registers the result, points a service, scheduled rule or blue/green
//! deployment at it, and watches the rollout until it settles.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

// Re-exports for convenience
pub use application::RolloutContext;
pub use config::Config;
pub use domain::entities::{DeploymentOutcome, OverrideSet, RevisionId, TaskDefinitionSpec};
pub use domain::value_objects::{TaskRef, WaitTimeout};
pub use error::{exit_codes, RolloutError, RolloutResult};
