//! Category model

use serde::{Deserialize, Serialize};

use super::record::{RecordKind, SyncRecord};

/// A category grouping articles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Globally unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Parent category for nesting
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
    /// Soft delete flag for sync
    #[serde(default)]
    pub is_deleted: bool,
}

impl Category {
    /// Create a new top-level category
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: super::new_record_id(),
            name: name.into(),
            description: None,
            parent_id: None,
            created_at: now,
            updated_at: now,
            is_deleted: false,
        }
    }
}

impl SyncRecord for Category {
    const KIND: RecordKind = RecordKind::Category;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }
}
