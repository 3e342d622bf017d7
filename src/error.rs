//! Error types for ecs-rollout
//!
//! Library errors use `thiserror`. Every error carries enough structure
//! (kind + identifiers) for the CLI to render a precise message and pick an
//! exit code; only `main` reaches for `anyhow`.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::ports::RegistryError;
use crate::domain::services::MergeError;

/// Result type alias for ecs-rollout operations
pub type RolloutResult<T> = Result<T, RolloutError>;

/// Process exit codes.
pub mod exit_codes {
    /// Succeeded, or the caller asked not to wait.
    pub const OK: i32 = 0;
    /// Registry, configuration or I/O failure.
    pub const ERROR: i32 = 1;
    /// Rejected before any mutating call. Matches clap's usage-error code.
    pub const VALIDATION: i32 = 2;
    /// The rollout was observed to fail.
    pub const DEPLOYMENT_FAILED: i32 = 3;
    /// Stopped waiting; the outcome is unknown.
    pub const TIMED_OUT: i32 = 4;
    /// Interrupted by the user.
    pub const ABORTED: i32 = 130;
}

/// Main error type for ecs-rollout operations
#[derive(Error, Debug)]
pub enum RolloutError {
    /// Malformed input, detected before anything was submitted
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Overrides could not be merged onto the base revision
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// The registry rejected or failed a call
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RolloutError {
    /// Whether this error was raised before any mutating call.
    pub fn is_validation(&self) -> bool {
        matches!(self, RolloutError::Validation(_) | RolloutError::Merge(_))
    }

    /// Exit code the CLI should terminate with.
    pub fn exit_code(&self) -> i32 {
        if self.is_validation() {
            exit_codes::VALIDATION
        } else {
            exit_codes::ERROR
        }
    }
}

/// Input rejected during parsing or pre-flight checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid task reference '{input}': {reason}")]
    InvalidTaskRef { input: String, reason: String },

    #[error("invalid timeout {value}: use -1 to skip waiting or a number of seconds >= 0")]
    InvalidTimeout { value: i64 },

    #[error("invalid command for container '{container}': {message}")]
    InvalidCommand { container: String, message: String },

    #[error("invalid image '{image}' for container '{container}': {message}")]
    InvalidImage {
        container: String,
        image: String,
        message: String,
    },

    #[error("tag override must not be empty")]
    EmptyTag,

    #[error("{which} ARN must not be empty")]
    EmptyRole { which: &'static str },

    #[error("task count must be at least 1")]
    InvalidTaskCount,

    #[error("invalid module version '{input}': {reason}")]
    InvalidModuleVersion { input: String, reason: String },

    #[error("--module-version selects a revision by tags and needs a bare family, not '{task}'")]
    ModuleVersionNeedsFamily { task: String },

    #[error(
        "conflicting image overrides for container '{container}': '{first}' and '{second}'"
    )]
    ConflictingImageOverride {
        container: String,
        first: String,
        second: String,
    },

    #[error("cannot read env file {path}: {message}")]
    EnvFile { path: PathBuf, message: String },

    #[error(
        "launch type {launch_type} requires at least one subnet (--subnet) and one security group (--security-group)"
    )]
    MissingNetworkConfiguration { launch_type: String },

    #[error("{what} cannot be applied as a run-task override; pass --register to run a new revision")]
    UnsupportedRunOverride { what: String },

    #[error("invalid launch type '{value}' (expected EC2 or FARGATE)")]
    InvalidLaunchType { value: String },
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid event rule pattern '{pattern}': {message}")]
    InvalidEventRule { pattern: String, message: String },

    #[error(
        "no registry configured\n  → Fix: pass --endpoint URL or --state-file PATH\n  → Or set ECS_ROLLOUT_ENDPOINT / ECS_ROLLOUT_STATE_FILE"
    )]
    NoRegistry,
}
