//! Syncable record envelope and per-record sync metadata

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Wire schema version stamped on every outgoing record
pub const SCHEMA_VERSION: u32 = 1;

/// The kind of domain record crossing the sync boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Article,
    Category,
}

impl RecordKind {
    /// Remote collection name for this kind
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Article => "articles",
            Self::Category => "categories",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Article => "article",
            Self::Category => "category",
        })
    }
}

/// A domain record the sync engine can reconcile.
///
/// Identity is `id()`; divergence is judged on `updated_at()` only.
pub trait SyncRecord: Clone + fmt::Debug + Serialize + DeserializeOwned {
    /// Kind used for collection routing and conflict labelling
    const KIND: RecordKind;

    /// Globally unique record identifier
    fn id(&self) -> &str;

    /// Last local modification time (Unix ms)
    fn updated_at(&self) -> i64;
}

/// Attribution attached to every record crossing the sync boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMetadata {
    /// Owning user
    pub user_id: String,
    /// Installation that produced the record
    pub device_id: String,
    /// Stamping time (Unix ms), not the record's own modification time
    pub timestamp: i64,
    /// Wire schema version
    pub version: u32,
}

/// A domain record plus its sync metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncableRecord<R> {
    #[serde(flatten)]
    pub record: R,
    pub sync_metadata: SyncMetadata,
}

impl<R: SyncRecord> SyncableRecord<R> {
    pub const fn new(record: R, sync_metadata: SyncMetadata) -> Self {
        Self {
            record,
            sync_metadata,
        }
    }

    pub fn id(&self) -> &str {
        self.record.id()
    }

    pub fn updated_at(&self) -> i64 {
        self.record.updated_at()
    }

    pub fn into_record(self) -> R {
        self.record
    }
}
