//! Deploy Options

use crate::domain::value_objects::WaitTimeout;

/// Options for the deploy use case
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub cluster: String,
    pub service: String,
    /// How long to watch the rollout
    pub timeout: WaitTimeout,
    /// Keep polling when a service event matches a failure rule
    pub ignore_warnings: bool,
    /// Deregister the service's previous revision once the rollout succeeds
    pub deregister: bool,
}

impl DeployOptions {
    pub fn new(cluster: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            service: service.into(),
            timeout: WaitTimeout::Bounded(std::time::Duration::from_secs(300)),
            ignore_warnings: false,
            deregister: false,
        }
    }

    pub fn with_timeout(mut self, timeout: WaitTimeout) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_ignore_warnings(mut self, ignore: bool) -> Self {
        self.ignore_warnings = ignore;
        self
    }

    pub fn with_deregister(mut self, deregister: bool) -> Self {
        self.deregister = deregister;
        self
    }
}
