//! JSON file implementation of `StatusSink`.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::debug;

use safeguard_contracts::{
    error::{SafeguardError, SafeguardResult},
    status::StatusRecord,
};
use safeguard_core::traits::StatusSink;

use crate::fsutil::atomic_write;

/// Writes the status record where dashboards and the scheduler pick it up.
#[derive(Debug, Clone)]
pub struct JsonFileStatusSink {
    path: PathBuf,
}

impl JsonFileStatusSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the last published record. `Ok(None)` if none was written yet.
    pub fn read(&self) -> SafeguardResult<Option<StatusRecord>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SafeguardError::StatusReadFailed {
                    reason: format!("cannot read '{}': {}", self.path.display(), e),
                })
            }
        };
        serde_json::from_str(&text).map(Some).map_err(|e| SafeguardError::StatusReadFailed {
            reason: format!("'{}' is not a status record: {}", self.path.display(), e),
        })
    }
}

impl StatusSink for JsonFileStatusSink {
    fn publish(&self, record: &StatusRecord) -> SafeguardResult<()> {
        let bytes = serde_json::to_vec_pretty(record).map_err(|e| SafeguardError::StatusWriteFailed {
            reason: format!("status not serializable: {}", e),
        })?;
        atomic_write(&self.path, &bytes).map_err(|e| SafeguardError::StatusWriteFailed {
            reason: format!("'{}': {}", self.path.display(), e),
        })?;
        debug!(path = %self.path.display(), traffic_light = %record.traffic_light, "status published");
        Ok(())
    }
}
