//! Error taxonomy shared by the store and REST surface (spec §7).
//!
//! `LaunchError` and `TriggerError` are deliberately *not* here — spec §7
//! says both are "absorbed so one bad job cannot stop the scheduler" and
//! never surface as an HTTP status, so they live next to the code that
//! raises and immediately logs them (`ecss-launcher`, `ecss-trigger`).

use thiserror::Error;

use crate::validate::ValidationError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("validation failed")]
    Validation(#[from] ValidationError),

    #[error("job {0} not found")]
    NotFound(String),

    #[error("job {0} already exists")]
    AlreadyExists(String),

    /// Transient backend I/O failure. The store adapter retries once
    /// internally (spec §7); if this variant escapes the adapter the
    /// retry already happened and failed again.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A stored record did not deserialize. Logged and skipped at boot;
    /// surfaced as a 500 only if hit by a point read (spec §7).
    #[error("stored record for {0} is corrupt: {1}")]
    BackendCorrupt(String, String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::BackendUnavailable(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Internal(format!("serialize: {e}"))
    }
}
