//! # safeguard-journal
//!
//! Immutable, append-only, SHA-256 hash-chained journal of supervised
//! cycles.
//!
//! ## Overview
//!
//! Every completed cycle is wrapped in a `JournalEntry` that links to the
//! previous entry via its SHA-256 hash. Editing any line breaks the chain
//! and is detected by `verify_chain`. The journal length also tells the
//! cycle runner whether a missing state file is a first run or a loss.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use safeguard_journal::JsonlJournal;
//! use safeguard_core::traits::CycleJournal;
//!
//! let journal = JsonlJournal::new("state/journal.jsonl");
//! journal.append(&cycle_record)?;
//! let verified = journal.verify()?;
//! ```

pub mod chain;
pub mod entry;
pub mod file;
pub mod memory;

pub use chain::{find_break, hash_entry, verify_chain};
pub use entry::JournalEntry;
pub use file::JsonlJournal;
pub use memory::InMemoryJournal;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::{TimeZone, Utc};

    use safeguard_contracts::{
        cycle::{CycleId, CycleOutcome, CycleRecord, Decision},
        engine::FailureKind,
        error::SafeguardError,
    };
    use safeguard_core::traits::CycleJournal;

    use super::{verify_chain, InMemoryJournal, JournalEntry, JsonlJournal};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn make_record(failures: u32) -> CycleRecord {
        let started_at = Utc.timestamp_opt(1_760_000_000 + i64::from(failures) * 60, 0).unwrap();
        let failed = failures > 0;
        CycleRecord {
            cycle_id: CycleId(uuid::Uuid::new_v4()),
            started_at,
            finished_at: started_at + chrono::Duration::seconds(5),
            decision: Decision::Run,
            outcome: if failed { CycleOutcome::RanFailure } else { CycleOutcome::RanSuccess },
            failure_kind: failed.then_some(FailureKind::NonZeroExit { code: 1 }),
            failure_detail: failed.then(|| "exit status: 1".to_string()),
            warning: None,
            consecutive_failures: failures,
            safe_state: failures >= 3,
            warnings: 0,
        }
    }

    // ── In-memory ─────────────────────────────────────────────────────────────

    #[test]
    fn test_hash_chain_integrity() {
        let journal = InMemoryJournal::new();
        journal.append(&make_record(0)).unwrap();
        journal.append(&make_record(1)).unwrap();
        journal.append(&make_record(2)).unwrap();

        assert!(journal.verify_integrity(), "chain must be valid after sequential appends");
        assert_eq!(journal.len().unwrap(), 3);
    }

    #[test]
    fn test_tamper_detection() {
        let journal = InMemoryJournal::new();
        journal.append(&make_record(1)).unwrap();
        journal.append(&make_record(2)).unwrap();
        journal.append(&make_record(3)).unwrap();

        // Rewrite history: pretend the first cycle succeeded.
        {
            let mut state = journal.state.lock().unwrap();
            state.entries[0].record.outcome = CycleOutcome::RanSuccess;
        }

        assert!(!journal.verify_integrity(), "chain must detect an edited record");
        assert_eq!(super::find_break(&journal.entries()), Some(0));
    }

    #[test]
    fn test_genesis_and_sequence() {
        let journal = InMemoryJournal::new();
        assert!(journal.is_empty().unwrap());
        journal.append(&make_record(0)).unwrap();
        journal.append(&make_record(1)).unwrap();

        let entries = journal.entries();
        assert_eq!(entries[0].prev_hash, JournalEntry::GENESIS_HASH);
        assert_eq!(entries[1].prev_hash, entries[0].this_hash);
        for (idx, entry) in entries.iter().enumerate() {
            assert_eq!(entry.sequence, idx as u64);
        }
    }

    #[test]
    fn test_verify_empty() {
        assert!(InMemoryJournal::new().verify_integrity());
        assert!(verify_chain(&[]));
    }

    #[test]
    fn test_reordered_entries_break_chain() {
        let journal = InMemoryJournal::new();
        journal.append(&make_record(0)).unwrap();
        journal.append(&make_record(1)).unwrap();

        let mut entries = journal.entries();
        entries.swap(0, 1);
        assert!(!verify_chain(&entries));
    }

    // ── JSON lines file ───────────────────────────────────────────────────────

    #[test]
    fn test_file_journal_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("journal.jsonl");

        let first = JsonlJournal::new(&path);
        assert_eq!(first.len().unwrap(), 0);
        first.append(&make_record(0)).unwrap();
        first.append(&make_record(1)).unwrap();

        // A fresh handle (the next process) continues the same chain.
        let second = JsonlJournal::new(&path);
        assert_eq!(second.len().unwrap(), 2);
        second.append(&make_record(2)).unwrap();

        let entries = second.read_entries().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].sequence, 2);
        assert_eq!(entries[2].prev_hash, entries[1].this_hash);
        assert_eq!(second.verify().unwrap(), 3);
    }

    #[test]
    fn test_file_journal_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let journal = JsonlJournal::new(dir.path().join("absent.jsonl"));
        assert!(journal.read_entries().unwrap().is_empty());
        assert_eq!(journal.verify().unwrap(), 0);
    }

    #[test]
    fn test_file_journal_detects_edited_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let journal = JsonlJournal::new(&path);
        journal.append(&make_record(1)).unwrap();
        journal.append(&make_record(2)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let edited = text.replacen("\"consecutive_failures\":1", "\"consecutive_failures\":0", 1);
        assert_ne!(text, edited);
        std::fs::write(&path, edited).unwrap();

        match JsonlJournal::new(&path).verify() {
            Err(SafeguardError::JournalCorrupt { reason }) => assert!(reason.contains("entry 0")),
            other => panic!("expected JournalCorrupt, got {:?}", other),
        }
    }

    #[test]
    fn test_file_journal_garbage_line_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let journal = JsonlJournal::new(&path);
        journal.append(&make_record(0)).unwrap();

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{not json").unwrap();

        let err = JsonlJournal::new(&path).len().unwrap_err();
        assert!(matches!(err, SafeguardError::JournalCorrupt { .. }));
    }
}
