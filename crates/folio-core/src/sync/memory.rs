//! In-process remote store for tests and offline demos.
//!
//! Records are kept as JSON values keyed by collection and id, so they go
//! through the same serde path as the HTTP transport.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::models::{SyncRecord, SyncableRecord};

use super::transport::{RequestContext, SyncTransport, TransportError};

/// Mock remote store.
///
/// Allows seeding remote records, injecting one-shot failures, stalling
/// pulls, and inspecting call counts. Clones share state.
#[derive(Debug, Default, Clone)]
pub struct MemoryTransport {
    inner: Arc<Mutex<MemoryTransportInner>>,
}

#[derive(Debug, Default)]
struct MemoryTransportInner {
    collections: BTreeMap<String, BTreeMap<String, Value>>,
    pull_calls: usize,
    push_batch_calls: usize,
    push_one_calls: usize,
    device_ids: Vec<String>,
    fail_next_pull: Option<String>,
    fail_next_push: Option<String>,
    stall_pulls: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryTransportInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store records on the remote side without counting a push.
    pub fn seed<R: SyncRecord>(
        &self,
        collection: &str,
        records: &[SyncableRecord<R>],
    ) -> Result<(), TransportError> {
        let encoded = encode_all(records)?;
        self.lock()
            .collections
            .entry(collection.to_string())
            .or_default()
            .extend(encoded);
        Ok(())
    }

    /// Current remote contents of a collection, ordered by id.
    pub fn records<R: SyncRecord>(
        &self,
        collection: &str,
    ) -> Result<Vec<SyncableRecord<R>>, TransportError> {
        let inner = self.lock();
        inner
            .collections
            .get(collection)
            .map(|records| decode_all(records.values()))
            .transpose()
            .map(Option::unwrap_or_default)
    }

    /// Cause the next pull to fail with a network error.
    pub fn fail_next_pull(&self, error: &str) {
        self.lock().fail_next_pull = Some(error.to_string());
    }

    /// Cause the next push (batch or single) to fail with a network error.
    pub fn fail_next_push(&self, error: &str) {
        self.lock().fail_next_push = Some(error.to_string());
    }

    /// Make pulls hang until the caller gives up.
    pub fn stall_pulls(&self, stall: bool) {
        self.lock().stall_pulls = stall;
    }

    pub fn pull_calls(&self) -> usize {
        self.lock().pull_calls
    }

    pub fn push_batch_calls(&self) -> usize {
        self.lock().push_batch_calls
    }

    pub fn push_one_calls(&self) -> usize {
        self.lock().push_one_calls
    }

    /// Total pushes of either kind.
    pub fn push_calls(&self) -> usize {
        let inner = self.lock();
        inner.push_batch_calls + inner.push_one_calls
    }

    /// Device ids observed on every request, in order.
    pub fn device_ids(&self) -> Vec<String> {
        self.lock().device_ids.clone()
    }

    fn begin_push(&self, context: &RequestContext, batch: bool) -> Result<(), TransportError> {
        let mut inner = self.lock();
        inner.device_ids.push(context.device_id.clone());
        if batch {
            inner.push_batch_calls += 1;
        } else {
            inner.push_one_calls += 1;
        }
        match inner.fail_next_push.take() {
            Some(error) => Err(TransportError::Network(error)),
            None => Ok(()),
        }
    }
}

impl SyncTransport for MemoryTransport {
    async fn pull<R: SyncRecord>(
        &self,
        collection: &str,
        context: &RequestContext,
    ) -> Result<Vec<SyncableRecord<R>>, TransportError> {
        let stalled = {
            let mut inner = self.lock();
            inner.pull_calls += 1;
            inner.device_ids.push(context.device_id.clone());
            if let Some(error) = inner.fail_next_pull.take() {
                return Err(TransportError::Network(error));
            }
            inner.stall_pulls
        };

        if stalled {
            std::future::pending::<()>().await;
        }
        self.records(collection)
    }

    async fn push_batch<R: SyncRecord>(
        &self,
        collection: &str,
        context: &RequestContext,
        records: &[SyncableRecord<R>],
    ) -> Result<(), TransportError> {
        self.begin_push(context, true)?;
        let encoded = encode_all(records)?;
        self.lock()
            .collections
            .entry(collection.to_string())
            .or_default()
            .extend(encoded);
        Ok(())
    }

    async fn push_one<R: SyncRecord>(
        &self,
        collection: &str,
        context: &RequestContext,
        record: &SyncableRecord<R>,
    ) -> Result<(), TransportError> {
        self.begin_push(context, false)?;
        let value = encode(record)?;
        self.lock()
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(record.id().to_string(), value);
        Ok(())
    }
}

fn encode<R: SyncRecord>(record: &SyncableRecord<R>) -> Result<Value, TransportError> {
    serde_json::to_value(record).map_err(|error| TransportError::InvalidPayload(error.to_string()))
}

fn encode_all<R: SyncRecord>(
    records: &[SyncableRecord<R>],
) -> Result<Vec<(String, Value)>, TransportError> {
    records
        .iter()
        .map(|record| Ok((record.id().to_string(), encode(record)?)))
        .collect()
}

fn decode_all<'a, R: SyncRecord>(
    values: impl Iterator<Item = &'a Value>,
) -> Result<Vec<SyncableRecord<R>>, TransportError> {
    values
        .map(|value| {
            serde_json::from_value(value.clone())
                .map_err(|error| TransportError::InvalidPayload(error.to_string()))
        })
        .collect()
}
