//! Article model

use serde::{Deserialize, Serialize};

use super::record::{RecordKind, SyncRecord};

/// An article authored in the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Globally unique identifier, never reused after deletion
    pub id: String,
    /// Article title
    pub title: String,
    /// Markdown body
    pub content: String,
    /// Owning category, if any
    #[serde(default)]
    pub category_id: Option<String>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
    /// Soft delete flag for sync
    #[serde(default)]
    pub is_deleted: bool,
}

impl Article {
    /// Create a new article with the given title and content
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: super::new_record_id(),
            title: title.into(),
            content: content.into(),
            category_id: None,
            created_at: now,
            updated_at: now,
            is_deleted: false,
        }
    }

    /// Place the article in a category
    #[must_use]
    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Get the title, falling back to the first content line when untitled
    #[must_use]
    pub fn display_title(&self, max_len: usize) -> String {
        let title = self.title.trim();
        let source = if title.is_empty() {
            self.content.lines().next().unwrap_or("").trim()
        } else {
            title
        };
        source.chars().take(max_len).collect()
    }
}

impl SyncRecord for Article {
    const KIND: RecordKind = RecordKind::Article;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }
}
