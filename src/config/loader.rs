//! Configuration loading

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::ConfigError;

use super::types::Config;

/// Project-local config file name
pub const PROJECT_CONFIG_FILE: &str = "ecs-rollout.toml";

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    /// Dotted path of the unknown key, e.g. `monitor.poll_intervall_secs`
    pub key: String,
    pub file: PathBuf,
    /// 1-indexed
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown config key '{}' in {}", self.key, self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{suggestion}'?)")?;
        }
        Ok(())
    }
}

/// Load configuration and collect non-fatal warnings (e.g. unknown keys).
pub fn load_with_warnings(path: &Path) -> Result<(Config, Vec<ConfigWarning>), ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let config: Config = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|key| {
            let leaf = key.rsplit('.').next().unwrap_or(key.as_str()).to_string();
            ConfigWarning {
                line: find_line_number(&content, &leaf),
                suggestion: suggest_key(&leaf),
                file: path.to_path_buf(),
                key,
            }
        })
        .collect();

    Ok((config, warnings))
}

/// Load the first config file found and apply environment overrides.
///
/// Search order: `explicit` (must exist), `<cwd>/ecs-rollout.toml`,
/// `<config dir>/ecs-rollout/config.toml`.
pub fn load_layered(
    explicit: Option<&Path>,
    cwd: &Path,
) -> Result<(Config, Vec<ConfigWarning>), ConfigError> {
    let (config, warnings) = match explicit {
        Some(path) => load_with_warnings(path)?,
        None => match candidate_paths(cwd).into_iter().find(|p| p.is_file()) {
            Some(path) => {
                debug!(path = %path.display(), "loading config");
                load_with_warnings(&path)?
            }
            None => (Config::default(), Vec::new()),
        },
    };
    Ok((with_env_overrides(config), warnings))
}

fn candidate_paths(cwd: &Path) -> Vec<PathBuf> {
    let mut paths = vec![cwd.join(PROJECT_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("ecs-rollout").join("config.toml"));
    }
    paths
}

/// Apply environment variable overrides (ECS_ROLLOUT_* prefix)
pub fn with_env_overrides(config: Config) -> Config {
    apply_env_overrides(config, |name| std::env::var(name).ok())
}

pub fn apply_env_overrides(mut config: Config, var: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(endpoint) = var("ECS_ROLLOUT_ENDPOINT").filter(|v| !v.trim().is_empty()) {
        config.registry.endpoint = Some(endpoint);
    }

    if let Some(path) = var("ECS_ROLLOUT_STATE_FILE").filter(|v| !v.trim().is_empty()) {
        config.registry.state_file = Some(PathBuf::from(path));
    }

    if let Some(region) = var("ECS_ROLLOUT_REGION").filter(|v| !v.trim().is_empty()) {
        config.registry.region = Some(region);
    }

    if let Some(raw) = var("ECS_ROLLOUT_POLL_INTERVAL") {
        match raw.trim().parse() {
            Ok(secs) => config.monitor.poll_interval_secs = secs,
            Err(_) => warn!(value = %raw, "ignoring invalid ECS_ROLLOUT_POLL_INTERVAL"),
        }
    }

    if let Some(raw) = var("ECS_ROLLOUT_TIMEOUT") {
        match raw.trim().parse() {
            Ok(secs) => config.monitor.default_timeout_secs = secs,
            Err(_) => warn!(value = %raw, "ignoring invalid ECS_ROLLOUT_TIMEOUT"),
        }
    }

    config
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    content
        .lines()
        .position(|line| line.trim_start().starts_with(needle))
        .map(|i| i + 1)
}

pub(super) fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "registry",
        "endpoint",
        "region",
        "state_file",
        "request_timeout_secs",
        "monitor",
        "poll_interval_secs",
        "default_timeout_secs",
        "max_transient_retries",
        "backoff_initial_ms",
        "backoff_max_ms",
        "event_rules",
        "pattern",
        "category",
        "severity",
        "run",
        "started_by",
        "platform_version",
    ];

    let mut best: Option<(&str, usize)> = None;
    for candidate in CANDIDATES {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            Some((_, best_dist)) if dist >= best_dist => best,
            _ => Some((candidate, dist)),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ac) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, bc) in b.iter().enumerate() {
            let cost = usize::from(ac != bc);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
