//! Console Event Sink
//!
//! Human-readable progress on stderr. Results go to stdout through
//! [`super::output`], so piping a command's output never captures progress.

use std::io::{self, Write};
use std::sync::Mutex;

use crate::domain::entities::RevisionChange;
use crate::domain::ports::{DeployEvent, DeployEventSink};
use crate::domain::value_objects::{EventSeverity, WaitTimeout};

use super::theme::{Icon, Style};

pub struct ConsoleEventSink {
    writer: Mutex<Box<dyn Write + Send>>,
    style: Style,
    show_diff: bool,
    detailed: bool,
}

impl ConsoleEventSink {
    pub fn stderr(style: Style) -> Self {
        Self::with_writer(style, io::stderr())
    }

    pub fn with_writer<W: Write + Send + 'static>(style: Style, writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            style,
            show_diff: false,
            detailed: false,
        }
    }

    /// Print each revision change as it is computed.
    pub fn with_diff(mut self, show_diff: bool) -> Self {
        self.show_diff = show_diff;
        self
    }

    /// Print every poll, not just state changes.
    pub fn with_detail(mut self, detailed: bool) -> Self {
        self.detailed = detailed;
        self
    }
}

impl DeployEventSink for ConsoleEventSink {
    fn on_event(&self, event: DeployEvent) {
        let Some(line) = render_event(&event, self.style, self.show_diff) else {
            return;
        };
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{line}");
            let _ = writer.flush();
        }
    }

    fn wants_detailed_events(&self) -> bool {
        self.detailed
    }
}

fn render_change(change: &RevisionChange, style: Style) -> String {
    let icon = match change {
        RevisionChange::EnvironmentRemoved { .. } | RevisionChange::SecretRemoved { .. } => {
            Icon::Trash
        }
        _ => Icon::Change,
    };
    format!("  {}", style.line(icon, &change.to_string()))
}

/// One line for `event`, or `None` when the console stays quiet.
pub fn render_event(event: &DeployEvent, style: Style, show_diff: bool) -> Option<String> {
    let line = match event {
        DeployEvent::BaseResolved { revision } => {
            style.line(Icon::Arrow, &format!("Using task definition: {revision}"))
        }
        DeployEvent::RevisionChanged { change } => {
            if !show_diff {
                return None;
            }
            render_change(change, style)
        }
        DeployEvent::RevisionRegistered { revision } => style.line(
            Icon::Success,
            &format!("Registered new task definition: {revision}"),
        ),
        DeployEvent::RevisionDeregistered { revision } => style.line(
            Icon::Trash,
            &format!("Deregistered task definition: {revision}"),
        ),
        DeployEvent::ServiceUpdated {
            cluster,
            service,
            revision,
            desired_count,
        } => {
            let target = match (revision, desired_count) {
                (Some(revision), _) => format!("to {revision}"),
                (None, Some(count)) => format!("to desired count {count}"),
                (None, None) => String::new(),
            };
            style.line(
                Icon::Success,
                &format!("Updated service {service} in cluster {cluster} {target}")
                    .trim_end()
                    .to_string(),
            )
        }
        DeployEvent::WaitStarted { timeout } => match timeout {
            WaitTimeout::NoWait => style.line(Icon::Arrow, "Not waiting for the rollout"),
            WaitTimeout::Bounded(_) => style.line(
                Icon::Progress,
                &format!("Waiting up to {timeout} for the rollout"),
            ),
        },
        DeployEvent::Progress {
            running,
            desired,
            pending,
            on_target,
            elapsed,
        } => style.dim(&format!(
            "  {}s: {running}/{desired} running, {pending} pending, {on_target} on new revision",
            elapsed.as_secs()
        )),
        DeployEvent::EventMatched {
            category,
            severity,
            message,
            ignored,
        } => {
            let icon = match (severity, ignored) {
                (EventSeverity::Error, false) => Icon::Error,
                _ => Icon::Warning,
            };
            let suffix = if *ignored { " (ignored)" } else { "" };
            style.line(icon, &format!("[{category}] {message}{suffix}"))
        }
        DeployEvent::TransientError { attempt, message } => style.line(
            Icon::Warning,
            &format!("Poll failed (attempt {attempt}), retrying: {message}"),
        ),
        DeployEvent::BlueGreenCreated { deployment_id } => style.line(
            Icon::Success,
            &format!("Created blue/green deployment {deployment_id}"),
        ),
        DeployEvent::BlueGreenProgress {
            deployment_id,
            state,
        } => style.dim(&format!("  {deployment_id}: {state}")),
        DeployEvent::TaskStarted { task_arn } => {
            style.line(Icon::Success, &format!("Started task: {task_arn}"))
        }
        DeployEvent::TaskFailed { reason } => {
            style.line(Icon::Error, &format!("Task failed to start: {reason}"))
        }
        DeployEvent::RuleUpdated { rule, target_id } => style.line(
            Icon::Success,
            &format!("Updated scheduled rule {rule} (target {target_id})"),
        ),
        // The outcome is part of the command's result on stdout.
        DeployEvent::Finished { .. } => return None,
    };
    Some(line)
}
