//! JSON Event Sink
//!
//! Outputs rollout events as NDJSON for CI/automation consumption.

use crate::domain::entities::{DeploymentOutcome, RevisionId};
use crate::domain::ports::{DeployEvent, DeployEventSink};
use std::io::{self, Write};
use std::sync::Mutex;

/// Event sink that outputs NDJSON events
pub struct JsonEventSink {
    /// Mutex to ensure thread-safe writes
    writer: Mutex<Box<dyn Write + Send>>,
    command: &'static str,
}

impl JsonEventSink {
    /// Create a new JSON event sink writing to stdout
    pub fn stdout(command: &'static str) -> Self {
        Self::with_writer(command, io::stdout())
    }

    /// Create a JSON event sink writing to a custom writer
    pub fn with_writer<W: Write + Send + 'static>(command: &'static str, writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            command,
        }
    }

    fn write_event(&self, mut event: serde_json::Value) {
        event["command"] = self.command.into();
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", event);
            let _ = writer.flush();
        }
    }
}

/// JSON rendering of a revision identifier.
pub fn revision_json(revision: &RevisionId) -> serde_json::Value {
    serde_json::json!({
        "family": revision.family,
        "revision": revision.revision,
        "arn": revision.arn,
    })
}

/// JSON rendering of a terminal outcome; shared with the final summary.
pub fn outcome_json(outcome: &DeploymentOutcome) -> serde_json::Value {
    let mut json = serde_json::json!({ "status": outcome.label() });
    match outcome {
        DeploymentOutcome::Succeeded { final_task_count } => {
            json["final_task_count"] = (*final_task_count).into();
        }
        DeploymentOutcome::TimedOut {
            elapsed,
            running_count,
            desired_count,
        } => {
            json["elapsed_secs"] = elapsed.as_secs().into();
            json["running"] = (*running_count).into();
            json["desired"] = (*desired_count).into();
        }
        DeploymentOutcome::Failed { reason, events } => {
            json["reason"] = reason.as_str().into();
            json["events"] = events.clone().into();
        }
        DeploymentOutcome::Aborted { elapsed } => {
            json["elapsed_secs"] = elapsed.as_secs().into();
        }
        DeploymentOutcome::SkippedWait => {}
    }
    json
}

impl DeployEventSink for JsonEventSink {
    fn on_event(&self, event: DeployEvent) {
        let json = match event {
            DeployEvent::BaseResolved { revision } => serde_json::json!({
                "event": "base_resolved",
                "revision": revision_json(&revision),
            }),

            DeployEvent::RevisionChanged { change } => serde_json::json!({
                "event": "revision_changed",
                "container": change.container(),
                "change": change.to_string(),
            }),

            DeployEvent::RevisionRegistered { revision } => serde_json::json!({
                "event": "revision_registered",
                "revision": revision_json(&revision),
            }),

            DeployEvent::RevisionDeregistered { revision } => serde_json::json!({
                "event": "revision_deregistered",
                "revision": revision_json(&revision),
            }),

            DeployEvent::ServiceUpdated {
                cluster,
                service,
                revision,
                desired_count,
            } => serde_json::json!({
                "event": "service_updated",
                "cluster": cluster,
                "service": service,
                "revision": revision.as_ref().map(revision_json),
                "desired_count": desired_count,
            }),

            DeployEvent::WaitStarted { timeout } => serde_json::json!({
                "event": "wait_started",
                "timeout": timeout.to_string(),
            }),

            DeployEvent::Progress {
                running,
                desired,
                pending,
                on_target,
                elapsed,
            } => serde_json::json!({
                "event": "progress",
                "running": running,
                "desired": desired,
                "pending": pending,
                "on_target": on_target,
                "elapsed_secs": elapsed.as_secs(),
            }),

            DeployEvent::EventMatched {
                category,
                severity,
                message,
                ignored,
            } => serde_json::json!({
                "event": "service_event",
                "category": category,
                "severity": severity,
                "message": message,
                "ignored": ignored,
            }),

            DeployEvent::TransientError { attempt, message } => serde_json::json!({
                "event": "transient_error",
                "attempt": attempt,
                "message": message,
            }),

            DeployEvent::BlueGreenCreated { deployment_id } => serde_json::json!({
                "event": "blue_green_created",
                "deployment_id": deployment_id,
            }),

            DeployEvent::BlueGreenProgress {
                deployment_id,
                state,
            } => serde_json::json!({
                "event": "blue_green_progress",
                "deployment_id": deployment_id,
                "state": state.to_string(),
            }),

            DeployEvent::TaskStarted { task_arn } => serde_json::json!({
                "event": "task_started",
                "task_arn": task_arn,
            }),

            DeployEvent::TaskFailed { reason } => serde_json::json!({
                "event": "task_failed",
                "reason": reason,
            }),

            DeployEvent::RuleUpdated { rule, target_id } => serde_json::json!({
                "event": "rule_updated",
                "rule": rule,
                "target_id": target_id,
            }),

            DeployEvent::Finished { outcome } => {
                let mut json = outcome_json(&outcome);
                json["event"] = "finished".into();
                json
            }
        };

        self.write_event(json);
    }

    fn wants_detailed_events(&self) -> bool {
        true // JSON mode wants all events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::RevisionChange;
    use crate::domain::value_objects::{EventCategory, EventSeverity};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn lines(&self) -> Vec<serde_json::Value> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn revision() -> RevisionId {
        RevisionId {
            family: "web".to_string(),
            revision: 4,
            arn: "arn:aws:ecs:us-east-1:000000000000:task-definition/web:4".to_string(),
        }
    }

    #[test]
    fn one_line_per_event_tagged_with_command() {
        let buffer = SharedBuffer::default();
        let sink = JsonEventSink::with_writer("deploy", buffer.clone());

        sink.on_event(DeployEvent::RevisionRegistered {
            revision: revision(),
        });
        sink.on_event(DeployEvent::RevisionChanged {
            change: RevisionChange::Image {
                container: "web".to_string(),
                old: "web:1".to_string(),
                new: "web:2".to_string(),
            },
        });

        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "revision_registered");
        assert_eq!(lines[0]["command"], "deploy");
        assert_eq!(lines[0]["revision"]["revision"], 4);
        assert_eq!(lines[1]["container"], "web");
    }

    #[test]
    fn matched_events_carry_category_and_severity() {
        let buffer = SharedBuffer::default();
        let sink = JsonEventSink::with_writer("deploy", buffer.clone());

        sink.on_event(DeployEvent::EventMatched {
            category: EventCategory::Placement,
            severity: EventSeverity::Error,
            message: "unable to place a task".to_string(),
            ignored: false,
        });

        let line = &buffer.lines()[0];
        assert_eq!(line["category"], "placement");
        assert_eq!(line["severity"], "error");
    }

    #[test]
    fn finished_event_embeds_the_outcome() {
        let buffer = SharedBuffer::default();
        let sink = JsonEventSink::with_writer("scale", buffer.clone());

        sink.on_event(DeployEvent::Finished {
            outcome: DeploymentOutcome::TimedOut {
                elapsed: Duration::from_secs(30),
                running_count: 1,
                desired_count: 3,
            },
        });

        let line = &buffer.lines()[0];
        assert_eq!(line["event"], "finished");
        assert_eq!(line["status"], "timed_out");
        assert_eq!(line["elapsed_secs"], 30);
        assert_eq!(line["desired"], 3);
    }
}
