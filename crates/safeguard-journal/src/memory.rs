//! In-memory implementation of `CycleJournal`.
//!
//! Keeps all entries in a `Vec` behind a `Mutex`. Used in tests and for
//! dry runs where nothing should touch the disk.

use std::sync::{Arc, Mutex};

use tracing::debug;

use safeguard_contracts::{
    cycle::CycleRecord,
    error::{SafeguardError, SafeguardResult},
};
use safeguard_core::traits::CycleJournal;

use crate::{
    chain::{hash_entry, verify_chain},
    entry::JournalEntry,
};

pub(crate) struct InMemoryState {
    pub(crate) entries: Vec<JournalEntry>,
    pub(crate) last_hash: String,
}

/// An in-memory, append-only cycle journal backed by a SHA-256 hash chain.
///
/// Clones share the same entries.
#[derive(Clone)]
pub struct InMemoryJournal {
    pub(crate) state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryJournal {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryState {
                entries: Vec::new(),
                last_hash: JournalEntry::GENESIS_HASH.to_string(),
            })),
        }
    }

    /// Snapshot of all entries in chain order.
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.state.lock().map(|s| s.entries.clone()).unwrap_or_default()
    }

    pub fn verify_integrity(&self) -> bool {
        self.state.lock().map(|s| verify_chain(&s.entries)).unwrap_or(false)
    }

    fn locked(&self) -> SafeguardResult<std::sync::MutexGuard<'_, InMemoryState>> {
        self.state.lock().map_err(|e| SafeguardError::JournalWriteFailed {
            reason: format!("journal state lock poisoned: {}", e),
        })
    }
}

impl Default for InMemoryJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleJournal for InMemoryJournal {
    fn append(&self, record: &CycleRecord) -> SafeguardResult<()> {
        let mut state = self.locked()?;

        let sequence = state.entries.len() as u64;
        let prev_hash = state.last_hash.clone();
        let this_hash = hash_entry(sequence, record, &prev_hash)?;

        state.entries.push(JournalEntry {
            sequence,
            record: record.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.last_hash = this_hash;

        debug!(sequence, cycle_id = %record.cycle_id, "journal entry appended (memory)");
        Ok(())
    }

    fn len(&self) -> SafeguardResult<u64> {
        Ok(self.locked()?.entries.len() as u64)
    }
}
