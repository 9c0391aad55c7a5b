//! Journal entry type.
//!
//! `JournalEntry` wraps a `CycleRecord` with its position in the journal and
//! the SHA-256 hashes that make tampering detectable.

use serde::{Deserialize, Serialize};

use safeguard_contracts::cycle::CycleRecord;

/// One line of the cycle journal.
///
/// Each entry commits to the previous entry via `prev_hash`. Modifying any
/// field, including those of the embedded `record`, invalidates `this_hash`
/// and every later `prev_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position in the journal, starting at 0.
    pub sequence: u64,

    /// The completed cycle.
    pub record: CycleRecord,

    /// `this_hash` of the previous entry, or `GENESIS_HASH` for the first.
    pub prev_hash: String,

    /// SHA-256 (hex) over (sequence, prev_hash, canonical JSON of record).
    pub this_hash: String,
}

impl JournalEntry {
    /// The `prev_hash` of the first entry in every journal: 64 hex zeros.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}
