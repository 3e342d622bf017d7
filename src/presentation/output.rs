//! Output Rendering
//!
//! Every command result renders to a text block or a final JSON line.

use std::fmt::Write as _;

use serde_json::{json, Value};

use crate::application::{
    CodeDeployResult, CronResult, DeployResult, RunResult, ScaleResult, UpdateResult,
};
use crate::domain::entities::{DeploymentOutcome, RevisionChange, RevisionId};
use crate::error::{exit_codes, RolloutError};
use crate::infrastructure::events::{outcome_json, revision_json};

use super::theme::{Icon, Style};

/// Output format for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// NDJSON for scripting; the result is the last line
    Json,
}

/// A command result the CLI can print.
pub trait Report {
    fn text(&self, style: Style) -> String;
    fn json(&self) -> Value;
    fn exit_code(&self) -> i32;
}

/// The final stdout block for `report`.
pub fn render_report(
    report: &dyn Report,
    format: OutputFormat,
    command: &str,
    style: Style,
) -> String {
    match format {
        OutputFormat::Text => report.text(style),
        OutputFormat::Json => {
            let mut body = report.json();
            body["event"] = "complete".into();
            body["command"] = command.into();
            body["exit_code"] = report.exit_code().into();
            body.to_string()
        }
    }
}

/// How an error is shown; JSON errors go to stdout like results.
pub fn render_error(
    err: &RolloutError,
    format: OutputFormat,
    command: &str,
    style: Style,
) -> String {
    match format {
        OutputFormat::Text => style.line(Icon::Error, &format!("Error: {err}")),
        OutputFormat::Json => json!({
            "event": "error",
            "command": command,
            "kind": error_kind(err),
            "message": err.to_string(),
            "exit_code": err.exit_code(),
        })
        .to_string(),
    }
}

fn error_kind(err: &RolloutError) -> &'static str {
    match err {
        RolloutError::Validation(_) | RolloutError::Merge(_) => "validation",
        RolloutError::Registry(_) => "registry",
        RolloutError::Config(_) => "config",
        RolloutError::Io(_) => "io",
    }
}

fn outcome_line(outcome: &DeploymentOutcome, style: Style) -> String {
    match outcome {
        DeploymentOutcome::Succeeded { final_task_count } => style.line(
            Icon::Success,
            &format!("Deployment successful ({final_task_count} tasks running)"),
        ),
        DeploymentOutcome::SkippedWait => {
            style.line(Icon::Success, "Submitted; not waiting for the rollout")
        }
        DeploymentOutcome::TimedOut {
            elapsed,
            running_count,
            desired_count,
        } => style.line(
            Icon::Warning,
            &format!(
                "Stopped waiting after {}s ({running_count}/{desired_count} running); the rollout may still finish",
                elapsed.as_secs()
            ),
        ),
        DeploymentOutcome::Failed { reason, events } => {
            let mut out = style.line(Icon::Error, &format!("Deployment failed: {reason}"));
            for event in events {
                let _ = write!(out, "\n  {}", style.dim(event));
            }
            out
        }
        DeploymentOutcome::Aborted { elapsed } => style.line(
            Icon::Error,
            &format!("Aborted after {}s; the rollout was left running", elapsed.as_secs()),
        ),
    }
}

fn changes_json(changes: &[RevisionChange]) -> Value {
    changes.iter().map(|c| Value::from(c.to_string())).collect()
}

fn optional_revision(revision: Option<&RevisionId>) -> Value {
    revision.map(revision_json).unwrap_or(Value::Null)
}

fn change_count(changes: &[RevisionChange]) -> String {
    match changes.len() {
        0 => "no changes".to_string(),
        1 => "1 change".to_string(),
        n => format!("{n} changes"),
    }
}

fn push_deregistered(out: &mut String, deregistered: Option<&RevisionId>, style: Style) {
    if let Some(revision) = deregistered {
        let _ = write!(
            out,
            "\n  {}",
            style.line(Icon::Trash, &format!("deregistered {revision}"))
        );
    }
}

impl Report for DeployResult {
    fn text(&self, style: Style) -> String {
        let mut out = outcome_line(&self.outcome, style);
        let _ = write!(
            out,
            "\n  revision: {} (was {}, {})",
            self.revision,
            self.previous,
            change_count(&self.changes)
        );
        push_deregistered(&mut out, self.deregistered.as_ref(), style);
        out
    }

    fn json(&self) -> Value {
        json!({
            "outcome": outcome_json(&self.outcome),
            "previous": revision_json(&self.previous),
            "revision": revision_json(&self.revision),
            "changes": changes_json(&self.changes),
            "deregistered": optional_revision(self.deregistered.as_ref()),
        })
    }

    fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }
}

impl Report for ScaleResult {
    fn text(&self, style: Style) -> String {
        let mut out = outcome_line(&self.outcome, style);
        let _ = write!(
            out,
            "\n  desired count: {} -> {}",
            self.previous_count, self.desired_count
        );
        out
    }

    fn json(&self) -> Value {
        json!({
            "outcome": outcome_json(&self.outcome),
            "task_definition": self.task_definition_arn,
            "previous_count": self.previous_count,
            "desired_count": self.desired_count,
        })
    }

    fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }
}

impl Report for RunResult {
    fn text(&self, style: Style) -> String {
        let started: Vec<&str> = self.started().collect();
        let failures: Vec<&str> = self.failures().collect();

        let mut out = if failures.is_empty() {
            style.line(
                Icon::Success,
                &format!("Started {} task(s) from {}", started.len(), self.task_definition_arn),
            )
        } else {
            style.line(
                Icon::Error,
                &format!(
                    "{} of {} task(s) failed to start from {}",
                    failures.len(),
                    started.len() + failures.len(),
                    self.task_definition_arn
                ),
            )
        };
        for arn in started {
            let _ = write!(out, "\n  {}", style.line(Icon::Arrow, arn));
        }
        for reason in failures {
            let _ = write!(out, "\n  {}", style.line(Icon::Error, reason));
        }
        out
    }

    fn json(&self) -> Value {
        json!({
            "task_definition": self.task_definition_arn,
            "registered": optional_revision(self.registered.as_ref()),
            "changes": changes_json(&self.changes),
            "started": self.started().collect::<Vec<_>>(),
            "failures": self.failures().collect::<Vec<_>>(),
        })
    }

    fn exit_code(&self) -> i32 {
        RunResult::exit_code(self)
    }
}

impl Report for UpdateResult {
    fn text(&self, style: Style) -> String {
        let mut out = style.line(
            Icon::Success,
            &format!(
                "Registered {} (from {}, {})",
                self.revision,
                self.base,
                change_count(&self.changes)
            ),
        );
        push_deregistered(&mut out, self.deregistered.as_ref(), style);
        out
    }

    fn json(&self) -> Value {
        json!({
            "base": revision_json(&self.base),
            "revision": revision_json(&self.revision),
            "changes": changes_json(&self.changes),
            "deregistered": optional_revision(self.deregistered.as_ref()),
        })
    }

    fn exit_code(&self) -> i32 {
        exit_codes::OK
    }
}

impl Report for CronResult {
    fn text(&self, style: Style) -> String {
        let mut out = style.line(
            Icon::Success,
            &format!(
                "Rule {} (target {}) now runs {} (was {})",
                self.rule, self.target_id, self.revision, self.base
            ),
        );
        push_deregistered(&mut out, self.deregistered.as_ref(), style);
        out
    }

    fn json(&self) -> Value {
        json!({
            "rule": self.rule,
            "target_id": self.target_id,
            "base": revision_json(&self.base),
            "revision": revision_json(&self.revision),
            "changes": changes_json(&self.changes),
            "deregistered": optional_revision(self.deregistered.as_ref()),
        })
    }

    fn exit_code(&self) -> i32 {
        exit_codes::OK
    }
}

impl Report for CodeDeployResult {
    fn text(&self, style: Style) -> String {
        let mut out = outcome_line(&self.outcome, style);
        let _ = write!(
            out,
            "\n  deployment: {} ({}/{})",
            self.deployment_id, self.group.application, self.group.deployment_group
        );
        let _ = write!(
            out,
            "\n  revision: {} (was {}, {})",
            self.revision,
            self.previous,
            change_count(&self.changes)
        );
        push_deregistered(&mut out, self.deregistered.as_ref(), style);
        out
    }

    fn json(&self) -> Value {
        json!({
            "outcome": outcome_json(&self.outcome),
            "deployment_id": self.deployment_id,
            "application": self.group.application,
            "deployment_group": self.group.deployment_group,
            "previous": revision_json(&self.previous),
            "revision": revision_json(&self.revision),
            "changes": changes_json(&self.changes),
            "deregistered": optional_revision(self.deregistered.as_ref()),
        })
    }

    fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }
}
