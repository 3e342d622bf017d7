//! Configuration type definitions

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::services::{EventPolicy, EventRule, MonitorSettings};
use crate::domain::value_objects::{EventCategory, EventSeverity, WaitTimeout};
use crate::error::{ConfigError, ValidationError};

use super::loader::{self, ConfigWarning};

/// Where registry calls go
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// JSON-over-HTTP endpoint
    pub endpoint: Option<String>,
    pub region: Option<String>,
    /// Local JSON state file used instead of an endpoint
    pub state_file: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: None,
            state_file: None,
            request_timeout_secs: 30,
        }
    }
}

/// One `[[monitor.event_rules]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRuleConfig {
    pub pattern: String,
    pub category: EventCategory,
    #[serde(default)]
    pub severity: EventSeverity,
}

/// Polling and failure detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub poll_interval_secs: u64,
    /// Used when `--timeout` is not given; `-1` means don't wait
    pub default_timeout_secs: i64,
    pub max_transient_retries: u32,
    pub backoff_initial_ms: u64,
    pub backoff_max_ms: u64,
    /// Replaces the built-in rules when non-empty
    pub event_rules: Vec<EventRuleConfig>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            default_timeout_secs: 300,
            max_transient_retries: 5,
            backoff_initial_ms: 500,
            backoff_max_ms: 10_000,
            event_rules: Vec::new(),
        }
    }
}

/// Defaults for `ecs run`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub started_by: Option<String>,
    pub platform_version: Option<String>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub registry: RegistryConfig,
    pub monitor: MonitorConfig,
    pub run: RunConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::load_with_warnings(path)?.0)
    }

    /// Load configuration and collect non-fatal warnings (e.g. unknown keys).
    pub fn load_with_warnings(path: &Path) -> Result<(Self, Vec<ConfigWarning>), ConfigError> {
        loader::load_with_warnings(path)
    }

    /// Monitor tunables with the event rules compiled.
    pub fn monitor_settings(&self) -> Result<MonitorSettings, ConfigError> {
        let policy = if self.monitor.event_rules.is_empty() {
            EventPolicy::default_rules()
        } else {
            let rules = self
                .monitor
                .event_rules
                .iter()
                .map(|r| EventRule::new(&r.pattern, r.category, r.severity))
                .collect::<Result<Vec<_>, _>>()?;
            EventPolicy::new(rules)
        };

        Ok(MonitorSettings {
            poll_interval: Duration::from_secs(self.monitor.poll_interval_secs.max(1)),
            max_transient_retries: self.monitor.max_transient_retries,
            backoff_initial: Duration::from_millis(self.monitor.backoff_initial_ms),
            backoff_max: Duration::from_millis(self.monitor.backoff_max_ms),
            policy,
        })
    }

    pub fn default_timeout(&self) -> Result<WaitTimeout, ValidationError> {
        WaitTimeout::from_seconds(self.monitor.default_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.registry.request_timeout_secs.max(1))
    }
}
