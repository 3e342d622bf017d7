//! In-memory registry

use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::ports::{Clock, RegistryResult};
use crate::infrastructure::clock::SystemClock;

use super::local::{LocalRegistry, StateStore};
use super::state::RegistryState;

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<RegistryState>,
}

impl StateStore for MemoryStore {
    fn view<T>(&self, f: impl FnOnce(&RegistryState) -> RegistryResult<T>) -> RegistryResult<T> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    fn update<T>(
        &self,
        f: impl FnOnce(&mut RegistryState) -> RegistryResult<T>,
    ) -> RegistryResult<T> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        // Work on a copy so a failed call leaves nothing half-applied.
        let mut draft = state.clone();
        let result = f(&mut draft)?;
        *state = draft;
        Ok(result)
    }
}

pub type InMemoryRegistry = LocalRegistry<MemoryStore>;

impl LocalRegistry<MemoryStore> {
    pub fn new(state: RegistryState) -> Self {
        Self::with_clock(state, Arc::new(SystemClock))
    }

    pub fn with_clock(state: RegistryState, clock: Arc<dyn Clock>) -> Self {
        LocalRegistry::with_store(
            MemoryStore {
                state: Mutex::new(state),
            },
            clock,
        )
    }

    /// Mutate the state directly, e.g. to change a service's rollout behaviour.
    pub fn edit(&self, f: impl FnOnce(&mut RegistryState)) {
        let _ = self.store().update(|state| {
            f(state);
            Ok(())
        });
    }
}
