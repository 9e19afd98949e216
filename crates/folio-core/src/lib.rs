//! folio-core - Core library for Folio
//!
//! This crate contains the article/category models, the identity and
//! configuration layers, and the offline multi-device sync engine used by
//! every Folio front end. Editing, rendering, and local document storage live
//! outside this crate; the engine only borrows local record batches.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{
    Article, Category, ConflictSide, RecordKind, SyncConflict, SyncMetadata, SyncRecord,
    SyncableRecord,
};
