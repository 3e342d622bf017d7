//! Domain Services
//!
//! Pure business logic services that operate on domain entities. The monitor
//! is the only one that waits, and it does so through the `Clock` port.

pub mod deployment_monitor;
pub mod event_policy;
pub mod revision_diff;
pub mod revision_merger;

pub use deployment_monitor::{DeploymentMonitor, MonitorSettings};
pub use event_policy::{Classification, EventPolicy, EventRule};
pub use revision_diff::diff;
pub use revision_merger::{merge, MergeError};
