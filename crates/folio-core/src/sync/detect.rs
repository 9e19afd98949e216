//! Conflict detection between a local batch and pulled remote records.

use std::collections::HashMap;

use crate::models::{SyncConflict, SyncMetadata, SyncRecord, SyncableRecord};

/// Compares local records against remote records sharing the same `id`.
///
/// A conflict exists only when the remote copy is strictly newer. Equal
/// `updated_at` values are not a conflict, so ties favor pushing local
/// state. Records present on one side only are one-directional additions.
#[derive(Debug, Clone)]
pub struct ConflictDetector {
    metadata: SyncMetadata,
}

impl ConflictDetector {
    /// `metadata` is stamped on the local side of every emitted conflict.
    pub const fn new(metadata: SyncMetadata) -> Self {
        Self { metadata }
    }

    /// Detect conflicts in O(n + m). Both inputs are left untouched.
    pub fn detect<R: SyncRecord>(
        &self,
        local_records: &[R],
        remote_records: &[SyncableRecord<R>],
    ) -> Vec<SyncConflict<R>> {
        let remote_by_id = index_by_id(remote_records);

        local_records
            .iter()
            .filter_map(|local| {
                let remote = remote_by_id.get(local.id())?;
                is_remote_newer(local, remote).then(|| {
                    SyncConflict::new(
                        SyncableRecord::new(local.clone(), self.metadata.clone()),
                        (*remote).clone(),
                    )
                })
            })
            .collect()
    }
}

/// Remote records whose `id` is absent from the local batch.
pub fn remote_only<R: SyncRecord>(
    local_records: &[R],
    remote_records: &[SyncableRecord<R>],
) -> Vec<SyncableRecord<R>> {
    let local_ids = local_records
        .iter()
        .map(SyncRecord::id)
        .collect::<std::collections::HashSet<_>>();
    remote_records
        .iter()
        .filter(|remote| !local_ids.contains(remote.id()))
        .cloned()
        .collect()
}

fn index_by_id<R: SyncRecord>(records: &[SyncableRecord<R>]) -> HashMap<&str, &SyncableRecord<R>> {
    records.iter().map(|record| (record.id(), record)).collect()
}

fn is_remote_newer<R: SyncRecord>(local: &R, remote: &SyncableRecord<R>) -> bool {
    remote.updated_at() > local.updated_at()
}
