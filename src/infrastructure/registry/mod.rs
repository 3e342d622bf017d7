//! Registry client implementations
//!
//! - `http` talks to the real (or an emulated) control plane
//! - `memory` and `file` keep a [`RegistryState`] locally for tests and
//!   offline runs

mod file;
mod http;
mod local;
mod memory;
mod state;
mod wire;

pub use file::{FileRegistry, FileStore};
pub use http::HttpRegistryClient;
pub use local::{LocalRegistry, StateStore, DEFAULT_REGION};
pub use memory::{InMemoryRegistry, MemoryStore};
pub use state::{
    task_definition_arn, BlueGreenOutcome, RegistryState, RevisionStatus, RolloutBehavior,
    StoredDeployment, StoredDeploymentGroup, StoredRevision, StoredRule, StoredService,
    StoredTaskRun, ACCOUNT_ID,
};
