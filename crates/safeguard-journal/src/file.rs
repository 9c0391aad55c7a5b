//! JSON-lines file implementation of `CycleJournal`.
//!
//! One `JournalEntry` per line, appended and synced before `append()`
//! returns. The chain tail (next sequence, last hash) is read from the file
//! on first use and cached for the lifetime of the journal handle.

use std::{
    fs::{self, OpenOptions},
    io::{BufRead, BufReader, ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, info};

use safeguard_contracts::{
    cycle::CycleRecord,
    error::{SafeguardError, SafeguardResult},
};
use safeguard_core::traits::CycleJournal;

use crate::{
    chain::{find_break, hash_entry},
    entry::JournalEntry,
};

#[derive(Debug, Clone)]
struct Tail {
    next_sequence: u64,
    last_hash: String,
}

/// Append-only cycle journal stored as JSON lines.
pub struct JsonlJournal {
    path: PathBuf,
    tail: Mutex<Option<Tail>>,
}

impl JsonlJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), tail: Mutex::new(None) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every entry on file. A missing file is an empty journal.
    ///
    /// # Errors
    ///
    /// `JournalCorrupt` if any line fails to parse.
    pub fn read_entries(&self) -> SafeguardResult<Vec<JournalEntry>> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(SafeguardError::JournalCorrupt {
                    reason: format!("cannot open '{}': {}", self.path.display(), e),
                })
            }
        };

        let mut entries = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| SafeguardError::JournalCorrupt {
                reason: format!("read error at line {}: {}", idx + 1, e),
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: JournalEntry = serde_json::from_str(&line).map_err(|e| SafeguardError::JournalCorrupt {
                reason: format!("line {}: {}", idx + 1, e),
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Read the journal and check the hash chain end to end.
    ///
    /// Returns the number of entries verified.
    pub fn verify(&self) -> SafeguardResult<u64> {
        let entries = self.read_entries()?;
        if let Some(sequence) = find_break(&entries) {
            return Err(SafeguardError::JournalCorrupt {
                reason: format!("hash chain broken at entry {}", sequence),
            });
        }
        info!(path = %self.path.display(), entries = entries.len(), "journal hash chain verified");
        Ok(entries.len() as u64)
    }

    fn with_tail<T>(&self, f: impl FnOnce(&mut Tail) -> SafeguardResult<T>) -> SafeguardResult<T> {
        let mut guard = self.tail.lock().map_err(|e| SafeguardError::JournalWriteFailed {
            reason: format!("journal tail lock poisoned: {}", e),
        })?;

        if guard.is_none() {
            let entries = self.read_entries()?;
            *guard = Some(Tail {
                next_sequence: entries.len() as u64,
                last_hash: entries
                    .last()
                    .map(|e| e.this_hash.clone())
                    .unwrap_or_else(|| JournalEntry::GENESIS_HASH.to_string()),
            });
        }

        match guard.as_mut() {
            Some(tail) => f(tail),
            None => Err(SafeguardError::JournalWriteFailed { reason: "journal tail unavailable".to_string() }),
        }
    }
}

impl CycleJournal for JsonlJournal {
    fn append(&self, record: &CycleRecord) -> SafeguardResult<()> {
        self.with_tail(|tail| {
            let sequence = tail.next_sequence;
            let prev_hash = tail.last_hash.clone();
            let this_hash = hash_entry(sequence, record, &prev_hash)?;
            let entry = JournalEntry { sequence, record: record.clone(), prev_hash, this_hash: this_hash.clone() };

            let write_failed = |e: std::io::Error| SafeguardError::JournalWriteFailed {
                reason: format!("'{}': {}", self.path.display(), e),
            };

            let mut line = serde_json::to_string(&entry).map_err(|e| SafeguardError::JournalWriteFailed {
                reason: format!("entry not serializable: {}", e),
            })?;
            line.push('\n');

            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(write_failed)?;
            }
            let mut file = OpenOptions::new().create(true).append(true).open(&self.path).map_err(write_failed)?;
            file.write_all(line.as_bytes()).map_err(write_failed)?;
            file.sync_data().map_err(write_failed)?;

            tail.next_sequence += 1;
            tail.last_hash = this_hash;

            debug!(sequence, cycle_id = %record.cycle_id, path = %self.path.display(), "journal entry appended");
            Ok(())
        })
    }

    fn len(&self) -> SafeguardResult<u64> {
        self.with_tail(|tail| Ok(tail.next_sequence))
    }
}
