//! Sync conflict model

use serde::{Deserialize, Serialize};

use super::record::{RecordKind, SyncRecord, SyncableRecord};

/// Which side of a conflict was kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSide {
    Local,
    Remote,
}

/// Detected divergence between the local and remote versions of one record.
///
/// A conflict is a record of a decision, not a queue entry: it is created by
/// detection and only ever replaced by a resolved copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConflict<R> {
    /// Record kind involved in the conflict
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Local version, freshly stamped at detection time
    pub local_version: SyncableRecord<R>,
    /// Remote version as pulled
    pub remote_version: SyncableRecord<R>,
    /// Whether a resolution has been committed to the remote store
    pub resolved: bool,
    /// Side kept by the resolution
    #[serde(default)]
    pub resolution: Option<ConflictSide>,
}

impl<R: SyncRecord> SyncConflict<R> {
    /// Create an unresolved conflict for a local/remote pair
    pub const fn new(local_version: SyncableRecord<R>, remote_version: SyncableRecord<R>) -> Self {
        Self {
            kind: R::KIND,
            local_version,
            remote_version,
            resolved: false,
            resolution: None,
        }
    }

    /// Identifier shared by both versions
    pub fn id(&self) -> &str {
        self.local_version.id()
    }

    /// The version on the given side
    pub const fn version(&self, side: ConflictSide) -> &SyncableRecord<R> {
        match side {
            ConflictSide::Local => &self.local_version,
            ConflictSide::Remote => &self.remote_version,
        }
    }

    /// The version kept by the resolution, once resolved
    pub fn winning_version(&self) -> Option<&SyncableRecord<R>> {
        self.resolution.map(|side| self.version(side))
    }

    /// Consume the conflict and return its resolved copy
    #[must_use]
    pub fn into_resolved(self, side: ConflictSide) -> Self {
        Self {
            resolved: true,
            resolution: Some(side),
            ..self
        }
    }
}
