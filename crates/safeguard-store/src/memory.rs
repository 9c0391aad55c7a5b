//! In-memory `StateStore` and `StatusSink` for tests and dry runs.
//!
//! Clones share the same cells, so a test can keep a handle while the
//! cycle runner owns the boxed store.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use safeguard_contracts::{
    error::{SafeguardError, SafeguardResult},
    state::SupervisorState,
    status::StatusRecord,
};
use safeguard_core::traits::{LockGuard, StateStore, StatusSink};

#[derive(Debug, Default)]
struct Cells {
    state: Option<SupervisorState>,
    locked: bool,
    fail_writes: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStateStore {
    cells: Arc<Mutex<Cells>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: SupervisorState) -> Self {
        let store = Self::default();
        store.with_cells(|c| c.state = Some(state));
        store
    }

    /// Make every subsequent `store()` fail with `StateWriteFailed`.
    pub fn fail_writes(&self, fail: bool) {
        self.with_cells(|c| c.fail_writes = fail);
    }

    pub fn snapshot(&self) -> Option<SupervisorState> {
        self.with_cells(|c| c.state.clone())
    }

    pub fn is_locked(&self) -> bool {
        self.with_cells(|c| c.locked)
    }

    fn with_cells<T>(&self, f: impl FnOnce(&mut Cells) -> T) -> T {
        let mut cells = self.cells.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut cells)
    }
}

impl StateStore for InMemoryStateStore {
    fn lock(&self) -> SafeguardResult<LockGuard> {
        let acquired = self.with_cells(|c| !std::mem::replace(&mut c.locked, true));
        if !acquired {
            return Err(SafeguardError::LockHeld {
                path: self.location(),
                holder: "this process".to_string(),
            });
        }
        let store = self.clone();
        Ok(LockGuard::new(move || store.with_cells(|c| c.locked = false)))
    }

    fn load(&self) -> SafeguardResult<Option<SupervisorState>> {
        Ok(self.snapshot())
    }

    fn store(&self, state: &SupervisorState) -> SafeguardResult<()> {
        self.with_cells(|c| {
            if c.fail_writes {
                return Err(SafeguardError::StateWriteFailed { reason: "simulated write failure".to_string() });
            }
            c.state = Some(state.clone());
            Ok(())
        })
    }

    fn location(&self) -> PathBuf {
        PathBuf::from("memory://state")
    }
}

/// Keeps every published record, newest last.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatusSink {
    published: Arc<Mutex<Vec<StatusRecord>>>,
}

impl InMemoryStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<StatusRecord> {
        self.published.lock().ok().and_then(|p| p.last().cloned())
    }

    pub fn count(&self) -> usize {
        self.published.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl StatusSink for InMemoryStatusSink {
    fn publish(&self, record: &StatusRecord) -> SafeguardResult<()> {
        let mut published = self.published.lock().map_err(|e| SafeguardError::StatusWriteFailed {
            reason: format!("status sink lock poisoned: {}", e),
        })?;
        published.push(record.clone());
        Ok(())
    }
}
