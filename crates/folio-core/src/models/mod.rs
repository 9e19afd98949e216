//! Data models for Folio

mod article;
mod category;
mod record;
mod sync_conflict;

pub use article::Article;
pub use category::Category;
pub use record::{RecordKind, SyncMetadata, SyncRecord, SyncableRecord, SCHEMA_VERSION};
pub use sync_conflict::{ConflictSide, SyncConflict};

/// Create a new record identifier using UUID v7 (time-sortable)
#[must_use]
pub fn new_record_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
