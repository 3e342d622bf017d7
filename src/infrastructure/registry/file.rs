//! File-backed registry
//!
//! Persists a [`RegistryState`] as JSON. Every call takes an advisory lock on
//! a sibling `.lock` file; updates are written to a temp file and renamed
//! over the state file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use tracing::debug;

use crate::domain::ports::{Clock, RegistryError, RegistryResult};
use crate::infrastructure::clock::SystemClock;

use super::local::{LocalRegistry, StateStore};
use super::state::RegistryState;

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn open_lock(&self) -> RegistryResult<fs::File> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| storage("create state directory", e))?;
        }
        fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| storage("open lock file", e))
    }

    fn load(&self) -> RegistryResult<RegistryState> {
        if !self.path.exists() {
            return Ok(RegistryState::default());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| storage("read state file", e))?;
        serde_json::from_str(&content).map_err(|e| RegistryError::Storage {
            message: format!("state file {} is corrupted: {e}", self.path.display()),
        })
    }

    fn save(&self, state: &RegistryState) -> RegistryResult<()> {
        let content = serde_json::to_string_pretty(state).map_err(|e| RegistryError::Storage {
            message: format!("cannot serialize registry state: {e}"),
        })?;
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| storage("create temp file", e))?;
        temp.write_all(content.as_bytes())
            .map_err(|e| storage("write temp file", e))?;
        temp.persist(&self.path)
            .map_err(|e| storage("replace state file", e.error))?;
        debug!(path = %self.path.display(), "saved registry state");
        Ok(())
    }
}

impl StateStore for FileStore {
    fn view<T>(&self, f: impl FnOnce(&RegistryState) -> RegistryResult<T>) -> RegistryResult<T> {
        let lock = self.open_lock()?;
        lock.lock_shared().map_err(|e| storage("lock state file", e))?;
        let result = self.load().and_then(|state| f(&state));
        let _ = lock.unlock();
        result
    }

    fn update<T>(
        &self,
        f: impl FnOnce(&mut RegistryState) -> RegistryResult<T>,
    ) -> RegistryResult<T> {
        let lock = self.open_lock()?;
        lock.lock_exclusive()
            .map_err(|e| storage("lock state file", e))?;
        let result = self.load().and_then(|mut state| {
            let value = f(&mut state)?;
            self.save(&state)?;
            Ok(value)
        });
        let _ = lock.unlock();
        result
    }
}

fn storage(action: &str, err: std::io::Error) -> RegistryError {
    RegistryError::Storage {
        message: format!("cannot {action}: {err}"),
    }
}

pub type FileRegistry = LocalRegistry<FileStore>;

impl LocalRegistry<FileStore> {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    pub fn open_with_clock(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        LocalRegistry::with_store(FileStore::new(path), clock)
    }

    pub fn path(&self) -> &Path {
        self.store().path()
    }
}
