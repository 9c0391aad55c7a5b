//! Lock file guarding the state file.
//!
//! The lock is a sibling file created with `create_new`, so exactly one
//! process can hold it. It records the holder's pid and acquisition time for
//! operators and is removed when the guard drops. A lock left behind by a
//! crashed process has to be removed by hand; the error names the path and
//! the recorded pid.

use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use safeguard_contracts::error::{SafeguardError, SafeguardResult};
use safeguard_core::traits::LockGuard;

use crate::fsutil::ensure_parent;

/// Contents of a lock file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub acquired_at: String,
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pid {} since {}", self.pid, self.acquired_at)
    }
}

/// Take the lock at `lock_path` or fail with `LockHeld` if it exists.
pub fn acquire(lock_path: &Path) -> SafeguardResult<LockGuard> {
    ensure_parent(lock_path).map_err(|e| SafeguardError::LockFailed {
        reason: format!("'{}': {}", lock_path.display(), e),
    })?;

    let mut file = match OpenOptions::new().write(true).create_new(true).open(lock_path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let holder = read_holder(lock_path);
            warn!(
                path = %lock_path.display(),
                holder_pid = holder.as_ref().map(|h| h.pid),
                "state lock already held"
            );
            return Err(SafeguardError::LockHeld {
                path: lock_path.to_path_buf(),
                holder: holder.map_or_else(|| "holder unknown".to_string(), |h| h.to_string()),
            });
        }
        Err(e) => {
            return Err(SafeguardError::LockFailed {
                reason: format!("'{}': {}", lock_path.display(), e),
            })
        }
    };

    let info = LockInfo { pid: std::process::id(), acquired_at: Utc::now().to_rfc3339() };
    // The lock is held by existence alone; the payload is informational.
    if let Ok(payload) = serde_json::to_vec(&info) {
        let _ = file.write_all(&payload);
        let _ = file.sync_all();
    }
    debug!(path = %lock_path.display(), pid = info.pid, "state lock acquired");

    let path: PathBuf = lock_path.to_path_buf();
    Ok(LockGuard::new(move || match fs::remove_file(&path) {
        Ok(()) => debug!(path = %path.display(), "state lock released"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove state lock"),
    }))
}

/// Who holds the lock, if the file is readable.
pub fn read_holder(lock_path: &Path) -> Option<LockInfo> {
    fs::read(lock_path).ok().and_then(|bytes| serde_json::from_slice(&bytes).ok())
}
