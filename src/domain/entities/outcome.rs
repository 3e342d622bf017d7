//! Deployment outcome produced by the monitor

use std::time::Duration;

use crate::error::exit_codes;

/// Terminal result of watching a rollout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentOutcome {
    /// Steady state reached on the intended revision
    Succeeded { final_task_count: u32 },
    /// Stopped waiting; the rollout may still finish later
    TimedOut {
        elapsed: Duration,
        running_count: u32,
        desired_count: u32,
    },
    /// A failure was observed; the submitted change is not undone
    Failed { reason: String, events: Vec<String> },
    /// Waiting was disabled
    SkippedWait,
    /// The caller stopped observation; the submitted change stands
    Aborted { elapsed: Duration },
}

impl DeploymentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            DeploymentOutcome::Succeeded { .. } | DeploymentOutcome::SkippedWait
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeploymentOutcome::Succeeded { .. } => "succeeded",
            DeploymentOutcome::TimedOut { .. } => "timed_out",
            DeploymentOutcome::Failed { .. } => "failed",
            DeploymentOutcome::SkippedWait => "skipped_wait",
            DeploymentOutcome::Aborted { .. } => "aborted",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            DeploymentOutcome::Succeeded { .. } | DeploymentOutcome::SkippedWait => exit_codes::OK,
            DeploymentOutcome::Failed { .. } => exit_codes::DEPLOYMENT_FAILED,
            DeploymentOutcome::TimedOut { .. } => exit_codes::TIMED_OUT,
            DeploymentOutcome::Aborted { .. } => exit_codes::ABORTED,
        }
    }
}
