//! Sync session orchestration.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::auth::IdentityProvider;
use crate::models::{Article, Category, SyncConflict, SyncRecord, SyncableRecord};
use crate::store::{KeyValueStore, LAST_SYNC_TIME_KEY};
use crate::util::unix_timestamp_millis_now;

use super::detect::{remote_only, ConflictDetector};
use super::device::DeviceIdentity;
use super::error::SyncError;
use super::resolve::ConflictResolver;
use super::stamp::MetadataStamper;
use super::state::SyncState;
use super::transport::{RequestContext, SyncTransport};

const CONFLICTS_DETECTED: &str = "conflicts detected";

/// Caller's policy for divergence found during a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveStrategy {
    /// Halt the session; resolve in bulk with the local side afterwards.
    Local,
    /// Remote wins: conflicting records are pushed with their remote version.
    Remote,
    /// Halt the session; the caller resolves each conflict.
    #[default]
    Manual,
}

/// Per-call configuration. Not persisted.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Push even when the local batch is empty.
    pub force_sync: bool,
    pub resolve_strategy: Option<ResolveStrategy>,
    /// Device id override for stamping and request attribution.
    pub device_id: Option<String>,
    pub cancellation: Option<CancellationToken>,
}

impl SyncOptions {
    #[must_use]
    pub const fn with_strategy(mut self, strategy: ResolveStrategy) -> Self {
        self.resolve_strategy = Some(strategy);
        self
    }

    #[must_use]
    pub const fn forced(mut self) -> Self {
        self.force_sync = true;
        self
    }

    #[must_use]
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn strategy(&self) -> ResolveStrategy {
        self.resolve_strategy.unwrap_or_default()
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// Outcome of one sync call. Consumed once by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResult<R> {
    pub success: bool,
    pub synced_items: usize,
    pub conflicts: Vec<SyncConflict<R>>,
    pub error: Option<String>,
    /// Remote records absent from the local batch, for the caller to persist.
    pub incoming: Vec<SyncableRecord<R>>,
    /// Remote versions that replaced conflicting local records under the
    /// remote strategy. The caller overwrites its local copies with these.
    pub superseded: Vec<SyncableRecord<R>>,
}

impl<R> SyncResult<R> {
    const fn synced(
        synced_items: usize,
        incoming: Vec<SyncableRecord<R>>,
        superseded: Vec<SyncableRecord<R>>,
    ) -> Self {
        Self {
            success: true,
            synced_items,
            conflicts: Vec::new(),
            error: None,
            incoming,
            superseded,
        }
    }

    fn conflicted(conflicts: Vec<SyncConflict<R>>, incoming: Vec<SyncableRecord<R>>) -> Self {
        Self {
            success: false,
            synced_items: 0,
            conflicts,
            error: Some(CONFLICTS_DETECTED.to_string()),
            incoming,
            superseded: Vec::new(),
        }
    }

    /// Render a failed session as a result value.
    pub fn from_error(error: &SyncError) -> Self {
        Self {
            success: false,
            synced_items: 0,
            conflicts: Vec::new(),
            error: Some(error.to_string()),
            incoming: Vec::new(),
            superseded: Vec::new(),
        }
    }
}

/// Orchestrates sync sessions for articles and categories.
///
/// At most one session runs at a time; a concurrent call is rejected with
/// `SyncError::AlreadySyncing`. `SyncState` is written only here.
pub struct SyncCoordinator<T, I> {
    transport: T,
    identity: I,
    stamper: MetadataStamper,
    store: Arc<dyn KeyValueStore>,
    session: Mutex<()>,
    state: watch::Sender<SyncState>,
}

impl<T: SyncTransport, I: IdentityProvider> SyncCoordinator<T, I> {
    /// Create a coordinator, recovering `last_sync_time` from `store`.
    pub fn new(transport: T, identity: I, store: Arc<dyn KeyValueStore>) -> Self {
        let last_sync_time = load_last_sync_time(store.as_ref());
        let (state, _) = watch::channel(SyncState::idle(last_sync_time));
        let device = DeviceIdentity::new(Arc::clone(&store));
        Self {
            transport,
            identity,
            stamper: MetadataStamper::new(device),
            store,
            session: Mutex::new(()),
            state,
        }
    }

    /// Latest status snapshot. Never blocks.
    pub fn sync_state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Receive every status change.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    pub const fn device(&self) -> &DeviceIdentity {
        self.stamper.device()
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn sync_articles(
        &self,
        local: &[Article],
        options: SyncOptions,
    ) -> Result<SyncResult<Article>, SyncError> {
        self.sync(local, options).await
    }

    pub async fn sync_categories(
        &self,
        local: &[Category],
        options: SyncOptions,
    ) -> Result<SyncResult<Category>, SyncError> {
        self.sync(local, options).await
    }

    /// Run one session: pull, detect, then push unless blocked.
    pub async fn sync<R: SyncRecord>(
        &self,
        local: &[R],
        options: SyncOptions,
    ) -> Result<SyncResult<R>, SyncError> {
        let Ok(_session) = self.session.try_lock() else {
            tracing::warn!("Rejected {} sync: another session is in flight", R::KIND);
            return Err(SyncError::AlreadySyncing);
        };

        self.state.send_modify(SyncState::begin);
        tracing::info!(
            "Starting {} sync with {} local record(s)",
            R::KIND,
            local.len()
        );

        match self.run_session(local, &options).await {
            Ok(result) if result.success => {
                let synced_at = unix_timestamp_millis_now();
                self.persist_last_sync_time(synced_at);
                self.state.send_modify(|state| state.finish_synced(synced_at));
                tracing::info!(
                    "{} sync complete: {} pushed, {} incoming",
                    R::KIND,
                    result.synced_items,
                    result.incoming.len()
                );
                Ok(result)
            }
            Ok(result) => {
                tracing::warn!(
                    "{} sync halted: {} conflict(s) under {:?} strategy",
                    R::KIND,
                    result.conflicts.len(),
                    options.strategy()
                );
                self.state
                    .send_modify(|state| state.finish_conflicts(CONFLICTS_DETECTED));
                Ok(result)
            }
            Err(error) => {
                tracing::error!("{} sync failed: {}", R::KIND, error);
                let message = error.to_string();
                self.state.send_modify(|state| state.finish_failed(message));
                Err(error)
            }
        }
    }

    /// Pull and detect without pushing or touching `SyncState`.
    ///
    /// Shares the session slot, so it fails with `AlreadySyncing` while a
    /// session or resolution is in flight.
    pub async fn pending_conflicts<R: SyncRecord>(
        &self,
        local: &[R],
    ) -> Result<Vec<SyncConflict<R>>, SyncError> {
        let Ok(_session) = self.session.try_lock() else {
            return Err(SyncError::AlreadySyncing);
        };
        let context = self.request_context(&SyncOptions::default())?;
        let remote = self
            .transport
            .pull::<R>(R::KIND.collection(), &context)
            .await?;
        let metadata = self.stamper.stamp_as(&context.user_id, &context.device_id);
        Ok(ConflictDetector::new(metadata).detect(local, &remote))
    }

    /// Commit one side of `conflict` and return its resolved copy.
    pub async fn resolve_conflict<R: SyncRecord>(
        &self,
        conflict: SyncConflict<R>,
        use_local: bool,
    ) -> Result<SyncConflict<R>, SyncError> {
        let Ok(_session) = self.session.try_lock() else {
            return Err(SyncError::AlreadySyncing);
        };
        let context = self.request_context(&SyncOptions::default())?;
        ConflictResolver::new(&self.transport, &context)
            .resolve_conflict(conflict, use_local)
            .await
    }

    /// Resolve every conflict with the side implied by `strategy`.
    pub async fn resolve_all<R: SyncRecord>(
        &self,
        conflicts: Vec<SyncConflict<R>>,
        strategy: ResolveStrategy,
    ) -> Result<Vec<SyncConflict<R>>, SyncError> {
        let Ok(_session) = self.session.try_lock() else {
            return Err(SyncError::AlreadySyncing);
        };
        let context = self.request_context(&SyncOptions::default())?;
        ConflictResolver::new(&self.transport, &context)
            .resolve_all(conflicts, strategy)
            .await
    }

    async fn run_session<R: SyncRecord>(
        &self,
        local: &[R],
        options: &SyncOptions,
    ) -> Result<SyncResult<R>, SyncError> {
        if options.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let context = self.request_context(options)?;
        let collection = R::KIND.collection();

        let remote = cancellable(options, self.transport.pull::<R>(collection, &context)).await??;
        tracing::debug!("Pulled {} remote {} record(s)", remote.len(), R::KIND);

        let metadata = self.stamper.stamp_as(&context.user_id, &context.device_id);
        let conflicts = ConflictDetector::new(metadata).detect(local, &remote);
        let incoming = remote_only(local, &remote);

        if !conflicts.is_empty() && options.strategy() != ResolveStrategy::Remote {
            return Ok(SyncResult::conflicted(conflicts, incoming));
        }

        let (outgoing, superseded) = self.outgoing_batch(local, conflicts, &context);
        if outgoing.is_empty() && !options.force_sync {
            tracing::debug!("Nothing to push for {}", collection);
        } else {
            cancellable(
                options,
                self.transport.push_batch(collection, &context, &outgoing),
            )
            .await??;
        }

        Ok(SyncResult::synced(outgoing.len(), incoming, superseded))
    }

    /// Stamp the local batch. Conflicting records are replaced by their remote
    /// version, which is stamped like the rest and also returned as superseded.
    fn outgoing_batch<R: SyncRecord>(
        &self,
        local: &[R],
        conflicts: Vec<SyncConflict<R>>,
        context: &RequestContext,
    ) -> (Vec<SyncableRecord<R>>, Vec<SyncableRecord<R>>) {
        let mut remote_wins = conflicts
            .into_iter()
            .map(|conflict| (conflict.id().to_string(), conflict.remote_version.record))
            .collect::<HashMap<_, _>>();
        let metadata = self.stamper.stamp_as(&context.user_id, &context.device_id);

        let mut superseded = Vec::with_capacity(remote_wins.len());
        let outgoing = local
            .iter()
            .map(|record| match remote_wins.remove(record.id()) {
                Some(winner) => {
                    let stamped = SyncableRecord::new(winner, metadata.clone());
                    superseded.push(stamped.clone());
                    stamped
                }
                None => SyncableRecord::new(record.clone(), metadata.clone()),
            })
            .collect();
        (outgoing, superseded)
    }

    fn request_context(&self, options: &SyncOptions) -> Result<RequestContext, SyncError> {
        let session = self
            .identity
            .current_session()
            .map_err(|error| SyncError::Unauthenticated(error.to_string()))?
            .ok_or_else(|| SyncError::Unauthenticated("no active session".to_string()))?;

        if session.is_expired() {
            return Err(SyncError::Unauthenticated("session expired".to_string()));
        }
        if !session.is_usable() {
            return Err(SyncError::Unauthenticated(
                "session has no bearer credential or user id".to_string(),
            ));
        }

        let device_id = options
            .device_id
            .as_deref()
            .map(str::trim)
            .filter(|device_id| !device_id.is_empty())
            .map_or_else(|| self.stamper.device().device_id(), ToString::to_string);

        Ok(RequestContext {
            user_id: session.user.id,
            device_id,
            bearer_token: session.access_token,
        })
    }

    fn persist_last_sync_time(&self, synced_at: i64) {
        if let Err(error) = self
            .store
            .set(LAST_SYNC_TIME_KEY, &synced_at.to_string())
        {
            tracing::warn!("Failed to persist last sync time: {}", error);
        }
    }
}

async fn cancellable<F: Future>(options: &SyncOptions, future: F) -> Result<F::Output, SyncError> {
    match &options.cancellation {
        Some(token) => tokio::select! {
            () = token.cancelled() => Err(SyncError::Cancelled),
            output = future => Ok(output),
        },
        None => Ok(future.await),
    }
}

fn load_last_sync_time(store: &dyn KeyValueStore) -> Option<i64> {
    match store.get(LAST_SYNC_TIME_KEY) {
        Ok(Some(raw)) => raw.trim().parse().ok(),
        Ok(None) => None,
        Err(error) => {
            tracing::warn!("Failed to recover last sync time: {}", error);
            None
        }
    }
}
