//! JSON file implementation of `StateStore`.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::debug;

use safeguard_contracts::{
    error::{SafeguardError, SafeguardResult},
    state::{SupervisorState, STATE_VERSION},
};
use safeguard_core::traits::{LockGuard, StateStore};

use crate::{
    fsutil::{atomic_write, sibling},
    lock,
};

/// Supervisor state stored as pretty-printed JSON, guarded by
/// `<state file>.lock`.
#[derive(Debug, Clone)]
pub struct JsonFileStateStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = sibling(&path, ".lock");
        Self { path, lock_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    fn corrupt(&self, reason: impl Into<String>) -> SafeguardError {
        SafeguardError::StateCorrupt { path: self.path.clone(), reason: reason.into() }
    }
}

impl StateStore for JsonFileStateStore {
    fn lock(&self) -> SafeguardResult<LockGuard> {
        lock::acquire(&self.lock_path)
    }

    fn load(&self) -> SafeguardResult<Option<SupervisorState>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state file");
                return Ok(None);
            }
            Err(e) if e.kind() == ErrorKind::InvalidData => return Err(self.corrupt(e.to_string())),
            Err(e) => {
                return Err(SafeguardError::StateReadFailed {
                    reason: format!("'{}': {}", self.path.display(), e),
                })
            }
        };

        // Check the version before the shape so a newer schema is reported as such.
        let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| self.corrupt(e.to_string()))?;
        match value.get("version").and_then(serde_json::Value::as_u64) {
            Some(v) if v == u64::from(STATE_VERSION) => {}
            Some(v) => return Err(self.corrupt(format!("unsupported state version {}", v))),
            None => return Err(self.corrupt("missing or non-numeric 'version'")),
        }

        let state: SupervisorState = serde_json::from_value(value).map_err(|e| self.corrupt(e.to_string()))?;
        debug!(
            path = %self.path.display(),
            consecutive_failures = state.consecutive_failures,
            safe_state = state.safe_state,
            "state loaded"
        );
        Ok(Some(state))
    }

    fn store(&self, state: &SupervisorState) -> SafeguardResult<()> {
        let bytes = serde_json::to_vec_pretty(state).map_err(|e| SafeguardError::StateWriteFailed {
            reason: format!("state not serializable: {}", e),
        })?;
        atomic_write(&self.path, &bytes).map_err(|e| SafeguardError::StateWriteFailed {
            reason: format!("'{}': {}", self.path.display(), e),
        })?;
        debug!(path = %self.path.display(), "state stored");
        Ok(())
    }

    fn location(&self) -> PathBuf {
        self.path.clone()
    }
}
