//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `registry/` - Registry clients (HTTP, in-memory, file-backed)
//! - `events/` - Machine-readable event sinks
//! - `clock` - Wall and manual clocks
//! - `env_file` - `KEY=VALUE` file reader

pub mod clock;
pub mod env_file;
pub mod events;
pub mod registry;

// Re-export for convenience
pub use clock::{ManualClock, SystemClock};
pub use env_file::read_env_file;
pub use events::JsonEventSink;
pub use registry::{FileRegistry, HttpRegistryClient, InMemoryRegistry, RegistryState};
