use std::io;
use std::path::PathBuf;

use folio_core::sync::{SyncError, TransportError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] folio_core::Error),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to read records from {path}: {message}")]
    RecordFile { path: PathBuf, message: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("No pending conflict for record id: {0}")]
    ConflictNotFound(String),
    #[error(
        "Sync is not configured for profile '{0}'. Run `folio config init --api-base-url <URL>` or set FOLIO_API_BASE_URL."
    )]
    SyncNotConfigured(String),
}
