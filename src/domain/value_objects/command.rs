//! Container command override value object
//!
//! A command is parsed exactly once, at input time, into one of two forms and
//! never re-interpreted later.

use serde::{Deserialize, Serialize};

/// A parsed command override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "form", content = "args", rename_all = "snake_case")]
pub enum ParsedCommand {
    /// Whitespace-split tokens. No quoting support.
    ShellTokens(Vec<String>),
    /// A literal JSON array of strings.
    JsonArray(Vec<String>),
}

impl ParsedCommand {
    /// Parse raw command text.
    ///
    /// Text that looks like a JSON list (`[` ... `]`) must be a valid JSON array
    /// of strings; everything else is split on whitespace.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            let args: Vec<String> = serde_json::from_str(trimmed).map_err(|e| {
                format!(
                    "command should be a valid JSON list of strings, got {}: {}",
                    raw, e
                )
            })?;
            return Ok(ParsedCommand::JsonArray(args));
        }

        let tokens: Vec<String> = trimmed.split_whitespace().map(str::to_string).collect();
        if tokens.is_empty() {
            return Err("command is empty".to_string());
        }
        Ok(ParsedCommand::ShellTokens(tokens))
    }

    pub fn args(&self) -> &[String] {
        match self {
            ParsedCommand::ShellTokens(args) | ParsedCommand::JsonArray(args) => args,
        }
    }

    pub fn into_args(self) -> Vec<String> {
        match self {
            ParsedCommand::ShellTokens(args) | ParsedCommand::JsonArray(args) => args,
        }
    }
}
