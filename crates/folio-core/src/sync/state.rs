//! Caller-visible sync status.

use serde::{Deserialize, Serialize};

/// Coarse phase of the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Idle,
    Syncing,
}

/// How the most recent session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Push succeeded and `last_sync_time` advanced.
    Synced,
    /// Divergence found under a non-remote strategy; nothing was pushed.
    ConflictsPending,
    /// Pull, push, identity, or cancellation failure.
    Failed,
}

/// Process-wide sync status, written only by the coordinator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub is_syncing: bool,
    /// Last successful push (Unix ms)
    pub last_sync_time: Option<i64>,
    pub error: Option<String>,
    pub last_outcome: Option<SyncOutcome>,
}

impl SyncState {
    /// Initial state, optionally seeded with a recovered `last_sync_time`.
    pub const fn idle(last_sync_time: Option<i64>) -> Self {
        Self {
            is_syncing: false,
            last_sync_time,
            error: None,
            last_outcome: None,
        }
    }

    pub const fn phase(&self) -> SyncPhase {
        if self.is_syncing {
            SyncPhase::Syncing
        } else {
            SyncPhase::Idle
        }
    }

    pub(crate) fn begin(&mut self) {
        self.is_syncing = true;
        self.error = None;
    }

    pub(crate) fn finish_synced(&mut self, synced_at: i64) {
        self.is_syncing = false;
        self.last_sync_time = Some(synced_at);
        self.last_outcome = Some(SyncOutcome::Synced);
    }

    pub(crate) fn finish_conflicts(&mut self, message: impl Into<String>) {
        self.is_syncing = false;
        self.error = Some(message.into());
        self.last_outcome = Some(SyncOutcome::ConflictsPending);
    }

    pub(crate) fn finish_failed(&mut self, message: impl Into<String>) {
        self.is_syncing = false;
        self.error = Some(message.into());
        self.last_outcome = Some(SyncOutcome::Failed);
    }
}
