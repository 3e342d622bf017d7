//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod clock;
pub mod deploy_events;
pub mod registry_client;
pub mod stop_signal;

pub use clock::Clock;
pub use deploy_events::{DeployEvent, DeployEventSink, NoopEventSink};
pub use registry_client::{RegistryClient, RegistryError, RegistryResult};
pub use stop_signal::{StopSignal, WatchGuard};
