//! Configuration module for ecs-rollout
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (ECS_ROLLOUT_*)
//! 3. `--config PATH`, or `./ecs-rollout.toml`
//! 4. User config (`<config dir>/ecs-rollout/config.toml`)
//! 5. Built-in defaults (lowest priority)
//!
//! Only the first config file found is read.

mod loader;
mod types;

pub use loader::{
    apply_env_overrides, load_layered, load_with_warnings, with_env_overrides, ConfigWarning,
    PROJECT_CONFIG_FILE,
};
pub use types::{Config, EventRuleConfig, MonitorConfig, RegistryConfig, RunConfig};
