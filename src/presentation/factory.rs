//! Context Factory
//!
//! Wires configuration and command-line flags into a [`RolloutContext`].
//! This is the dependency injection point for the application.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::application::RolloutContext;
use crate::config::Config;
use crate::domain::ports::{DeployEventSink, RegistryClient, StopSignal};
use crate::error::{ConfigError, RolloutResult};
use crate::infrastructure::registry::DEFAULT_REGION;
use crate::infrastructure::{FileRegistry, HttpRegistryClient, SystemClock};

/// Which registry backend a command talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryTarget {
    Http { endpoint: String, region: String },
    File { path: PathBuf, region: String },
}

/// Registry selection from the command line; each wins over any config value.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryFlags<'a> {
    pub endpoint: Option<&'a str>,
    pub state_file: Option<&'a Path>,
    pub region: Option<&'a str>,
}

/// Pick the backend: flags first, then config, endpoint before state file.
pub fn resolve_registry(
    config: &Config,
    flags: RegistryFlags<'_>,
) -> Result<RegistryTarget, ConfigError> {
    let region = flags
        .region
        .map(str::to_string)
        .or_else(|| config.registry.region.clone())
        .unwrap_or_else(|| DEFAULT_REGION.to_string());

    if let Some(endpoint) = flags.endpoint {
        return Ok(RegistryTarget::Http {
            endpoint: endpoint.to_string(),
            region,
        });
    }
    if let Some(path) = flags.state_file {
        return Ok(RegistryTarget::File {
            path: path.to_path_buf(),
            region,
        });
    }
    if let Some(endpoint) = &config.registry.endpoint {
        return Ok(RegistryTarget::Http {
            endpoint: endpoint.clone(),
            region,
        });
    }
    if let Some(path) = &config.registry.state_file {
        return Ok(RegistryTarget::File {
            path: path.clone(),
            region,
        });
    }
    Err(ConfigError::NoRegistry)
}

/// Create the registry client for `target`.
pub fn create_registry_client(
    target: &RegistryTarget,
    config: &Config,
) -> RolloutResult<Arc<dyn RegistryClient>> {
    let client: Arc<dyn RegistryClient> = match target {
        RegistryTarget::Http { endpoint, region } => {
            debug!(endpoint = %endpoint, region = %region, "using HTTP registry");
            Arc::new(HttpRegistryClient::new(
                endpoint.as_str(),
                region.as_str(),
                config.request_timeout(),
            )?)
        }
        RegistryTarget::File { path, region } => {
            debug!(path = %path.display(), region = %region, "using file registry");
            Arc::new(FileRegistry::open(path.as_path()).with_region(region.as_str()))
        }
    };
    Ok(client)
}

/// Build the context every use case runs in.
pub fn create_context(
    config: &Config,
    client: Arc<dyn RegistryClient>,
    events: Arc<dyn DeployEventSink>,
    stop: StopSignal,
) -> RolloutResult<RolloutContext> {
    Ok(RolloutContext::new(client, Arc::new(SystemClock))
        .with_events(events)
        .with_stop_signal(stop)
        .with_monitor_settings(config.monitor_settings()?))
}
