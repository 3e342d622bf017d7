//! Rollout Context
//!
//! Everything a use case needs from the outside world, passed explicitly.

use std::sync::Arc;

use crate::domain::ports::{
    Clock, DeployEvent, DeployEventSink, NoopEventSink, RegistryClient, StopSignal,
};
use crate::domain::services::{DeploymentMonitor, MonitorSettings};

/// Dependencies shared by every use case
#[derive(Clone)]
pub struct RolloutContext {
    pub client: Arc<dyn RegistryClient>,
    pub clock: Arc<dyn Clock>,
    pub events: Arc<dyn DeployEventSink>,
    pub stop: StopSignal,
    pub monitor_settings: MonitorSettings,
}

impl RolloutContext {
    /// Silent context with default monitor settings.
    pub fn new(client: Arc<dyn RegistryClient>, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            clock,
            events: Arc::new(NoopEventSink),
            stop: StopSignal::new(),
            monitor_settings: MonitorSettings::default(),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn DeployEventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_monitor_settings(mut self, settings: MonitorSettings) -> Self {
        self.monitor_settings = settings;
        self
    }

    pub fn client(&self) -> &dyn RegistryClient {
        self.client.as_ref()
    }

    pub fn monitor(&self) -> DeploymentMonitor<'_> {
        DeploymentMonitor::new(
            self.client.as_ref(),
            self.clock.as_ref(),
            self.events.as_ref(),
            &self.stop,
            &self.monitor_settings,
        )
    }

    pub(crate) fn emit(&self, event: DeployEvent) {
        self.events.on_event(event);
    }
}
