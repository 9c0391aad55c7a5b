//! Hash-chain primitives: hashing and chain integrity verification.
//!
//! Hash input layout (bytes, in order):
//!   1. sequence as 8-byte little-endian
//!   2. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   3. canonical JSON of record (serde_json, no pretty-printing)

use sha2::{Digest, Sha256};

use safeguard_contracts::{
    cycle::CycleRecord,
    error::{SafeguardError, SafeguardResult},
};

use crate::entry::JournalEntry;

/// Compute the SHA-256 hash for one journal entry.
///
/// Returns a lowercase 64-character hex string.
pub fn hash_entry(sequence: u64, record: &CycleRecord, prev_hash: &str) -> SafeguardResult<String> {
    let record_json = serde_json::to_vec(record).map_err(|e| SafeguardError::JournalWriteFailed {
        reason: format!("cycle record not serializable: {}", e),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&record_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Locate the first entry that breaks the chain.
///
/// An entry breaks the chain when its `sequence` is out of place, its
/// `prev_hash` does not match the preceding `this_hash` (or `GENESIS_HASH`),
/// or its `this_hash` does not match the recomputed value.
pub fn find_break(entries: &[JournalEntry]) -> Option<u64> {
    let mut expected_prev = JournalEntry::GENESIS_HASH.to_string();

    for (position, entry) in entries.iter().enumerate() {
        let position = position as u64;
        if entry.sequence != position || entry.prev_hash != expected_prev {
            return Some(position);
        }

        match hash_entry(entry.sequence, &entry.record, &entry.prev_hash) {
            Ok(recomputed) if recomputed == entry.this_hash => {}
            _ => return Some(position),
        }

        expected_prev = entry.this_hash.clone();
    }

    None
}

/// `true` when the whole chain is intact. An empty chain is valid.
pub fn verify_chain(entries: &[JournalEntry]) -> bool {
    find_break(entries).is_none()
}
