//! Sync error taxonomy.

use thiserror::Error;

use super::transport::TransportError;

/// Errors that abort a sync session or a resolution.
///
/// Conflict-blocked sessions are not errors: they return a `SyncResult`
/// with `success == false` and the conflict list.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Pull or push could not complete.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// No usable session or bearer credential was available.
    #[error("not authenticated: {0}")]
    Unauthenticated(String),

    /// Another session is already in flight.
    #[error("a sync session is already in progress")]
    AlreadySyncing,

    /// The caller cancelled the session.
    #[error("sync cancelled")]
    Cancelled,

    /// Bulk resolution was asked to pick a side under the manual strategy.
    #[error("{count} conflict(s) require manual resolution")]
    ManualResolutionRequired { count: usize },
}

impl SyncError {
    /// Returns true if the caller may retry the same call unchanged.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(error) => error.is_retryable(),
            Self::AlreadySyncing => true,
            _ => false,
        }
    }
}
