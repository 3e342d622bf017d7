//! Deploy Event Port
//!
//! Provides an observable interface for rollout operations.
//! Enables progress reporting, JSON event streams, and debugging.

use std::time::Duration;

use crate::domain::entities::{BlueGreenState, DeploymentOutcome, RevisionChange, RevisionId};
use crate::domain::value_objects::{EventCategory, EventSeverity, WaitTimeout};

/// Event emitted during rollout operations
#[derive(Debug, Clone)]
pub enum DeployEvent {
    /// Base revision fetched
    BaseResolved { revision: RevisionId },

    /// One difference between base and merged revision
    RevisionChanged { change: RevisionChange },

    /// New revision registered
    RevisionRegistered { revision: RevisionId },

    /// Previous revision deregistered
    RevisionDeregistered { revision: RevisionId },

    /// Service update submitted
    ServiceUpdated {
        cluster: String,
        service: String,
        revision: Option<RevisionId>,
        desired_count: Option<u32>,
    },

    /// Monitoring started
    WaitStarted { timeout: WaitTimeout },

    /// Poll result (detailed)
    Progress {
        running: u32,
        desired: u32,
        pending: u32,
        on_target: u32,
        elapsed: Duration,
    },

    /// A service event matched a failure rule
    EventMatched {
        category: EventCategory,
        severity: EventSeverity,
        message: String,
        ignored: bool,
    },

    /// A poll failed and will be retried
    TransientError { attempt: u32, message: String },

    /// Blue/green deployment created
    BlueGreenCreated { deployment_id: String },

    /// Blue/green state observed (detailed)
    BlueGreenProgress {
        deployment_id: String,
        state: BlueGreenState,
    },

    /// One-off task started
    TaskStarted { task_arn: String },

    /// One-off task failed to launch
    TaskFailed { reason: String },

    /// Scheduled rule now targets the new revision
    RuleUpdated { rule: String, target_id: String },

    /// Monitoring finished
    Finished { outcome: DeploymentOutcome },
}

/// Trait for receiving rollout events
///
/// Implementations can be:
/// - ConsoleEventSink: Progress display in terminal
/// - JsonEventSink: NDJSON event stream for CI
/// - NoopEventSink: Silent operation
pub trait DeployEventSink: Send + Sync {
    /// Handle a rollout event
    fn on_event(&self, event: DeployEvent);

    /// Check if this sink wants detailed events (per-poll progress)
    ///
    /// Some sinks (like CI) may only want summary events.
    fn wants_detailed_events(&self) -> bool {
        true
    }
}

/// No-op event sink for silent operation
pub struct NoopEventSink;

impl DeployEventSink for NoopEventSink {
    fn on_event(&self, _event: DeployEvent) {
        // Do nothing
    }

    fn wants_detailed_events(&self) -> bool {
        false
    }
}
