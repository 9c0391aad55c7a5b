//! Error types for the SafeGuard supervisor.
//!
//! Only hard cycle errors live here. An engine that crashes, hangs or exits
//! nonzero is NOT an error: it is an `EngineReport` value that the supervisor
//! records as a FAILURE. Everything in this enum means the cycle could not be
//! completed durably and an operator has to look at it.

use std::path::PathBuf;

use thiserror::Error;

/// The unified error type for SafeGuard.
#[derive(Debug, Error)]
pub enum SafeguardError {
    /// The persisted state exists but cannot be parsed or has an unknown schema.
    ///
    /// Never papered over with defaults: the failure count would be lost.
    #[error("supervisor state at '{path}' is corrupt: {reason}")]
    StateCorrupt { path: PathBuf, reason: String },

    /// The persisted state is missing although earlier cycles have run.
    #[error("supervisor state at '{path}' is missing but {recorded_cycles} cycle(s) are on record")]
    StateMissing { path: PathBuf, recorded_cycles: u64 },

    /// The persisted state could not be read (I/O level).
    #[error("failed to read supervisor state: {reason}")]
    StateReadFailed { reason: String },

    /// The updated state could not be persisted.
    ///
    /// Fatal: the decision taken in this cycle is not durable.
    #[error("failed to write supervisor state: {reason}")]
    StateWriteFailed { reason: String },

    /// Another cycle holds the state lock.
    ///
    /// `holder` names the owning process when the lock records one, so a
    /// stale lock can be told from a live one.
    #[error("state lock '{path}' is held by another cycle ({holder})")]
    LockHeld { path: PathBuf, holder: String },

    /// The state lock could not be acquired for a reason other than contention.
    #[error("failed to acquire state lock: {reason}")]
    LockFailed { reason: String },

    /// The observer-facing status record could not be written.
    #[error("failed to write status record: {reason}")]
    StatusWriteFailed { reason: String },

    /// A previously published status record could not be read back.
    #[error("failed to read status record: {reason}")]
    StatusReadFailed { reason: String },

    /// A cycle record could not be appended to the journal.
    #[error("failed to append to cycle journal: {reason}")]
    JournalWriteFailed { reason: String },

    /// The journal could not be read back or its hash chain is broken.
    #[error("cycle journal is corrupt: {reason}")]
    JournalCorrupt { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

/// Convenience alias used throughout the SafeGuard crates.
pub type SafeguardResult<T> = Result<T, SafeguardError>;
