//! Transport abstraction for the remote sync store.
//!
//! The engine needs only three capabilities: pull a collection, push a
//! batch, and push a single record. Retry, backoff, and connection reuse are
//! the transport's business.

use std::fmt;

use thiserror::Error;

use crate::models::{SyncRecord, SyncableRecord};

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level failure (DNS, connect, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The request exceeded the transport's timeout.
    #[error("request timed out")]
    Timeout,

    /// The remote rejected the bearer credential.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The remote answered with a non-success status.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The payload could not be encoded or decoded.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl TransportError {
    /// Returns true if the failure is transient.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::Server { status, .. } => *status >= 500 || *status == 429,
            Self::Unauthorized(_) | Self::InvalidPayload(_) => false,
        }
    }
}

/// Per-request attribution carried by every transport call.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: String,
    pub device_id: String,
    pub bearer_token: String,
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RequestContext")
            .field("user_id", &self.user_id)
            .field("device_id", &self.device_id)
            .field("bearer_token", &"[REDACTED]")
            .finish()
    }
}

/// Authenticated request/response access to the remote sync store.
#[allow(async_fn_in_trait)]
pub trait SyncTransport {
    /// Fetch every record in a collection.
    async fn pull<R: SyncRecord>(
        &self,
        collection: &str,
        context: &RequestContext,
    ) -> Result<Vec<SyncableRecord<R>>, TransportError>;

    /// Upsert a batch of records. All-or-nothing from the caller's view.
    async fn push_batch<R: SyncRecord>(
        &self,
        collection: &str,
        context: &RequestContext,
        records: &[SyncableRecord<R>],
    ) -> Result<(), TransportError>;

    /// Upsert exactly one record.
    async fn push_one<R: SyncRecord>(
        &self,
        collection: &str,
        context: &RequestContext,
        record: &SyncableRecord<R>,
    ) -> Result<(), TransportError>;
}
