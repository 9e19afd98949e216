//! Explicit conflict resolution.

use crate::models::{ConflictSide, SyncConflict, SyncRecord};

use super::coordinator::ResolveStrategy;
use super::error::SyncError;
use super::transport::{RequestContext, SyncTransport};

/// Commits a chosen side of a conflict to the remote store.
///
/// Resolution is a targeted single-record update, never a batch push. The
/// input conflict is consumed and a resolved copy is returned; on failure
/// nothing is returned and the caller still owns an open conflict to retry.
#[derive(Debug)]
pub struct ConflictResolver<'a, T> {
    transport: &'a T,
    context: &'a RequestContext,
}

impl<'a, T: SyncTransport> ConflictResolver<'a, T> {
    pub const fn new(transport: &'a T, context: &'a RequestContext) -> Self {
        Self { transport, context }
    }

    /// Push the local (`use_local`) or remote version and mark it resolved.
    pub async fn resolve_conflict<R: SyncRecord>(
        &self,
        conflict: SyncConflict<R>,
        use_local: bool,
    ) -> Result<SyncConflict<R>, SyncError> {
        let side = if use_local {
            ConflictSide::Local
        } else {
            ConflictSide::Remote
        };

        let winner = conflict.version(side);
        self.transport
            .push_one(R::KIND.collection(), self.context, winner)
            .await?;

        tracing::info!(
            "Resolved {} conflict {} keeping {:?} version",
            conflict.kind,
            conflict.id(),
            side
        );
        Ok(conflict.into_resolved(side))
    }

    /// Resolve every conflict with the side implied by `strategy`.
    ///
    /// Stops at the first transport failure; conflicts after it stay open.
    pub async fn resolve_all<R: SyncRecord>(
        &self,
        conflicts: Vec<SyncConflict<R>>,
        strategy: ResolveStrategy,
    ) -> Result<Vec<SyncConflict<R>>, SyncError> {
        let use_local = match strategy {
            ResolveStrategy::Local => true,
            ResolveStrategy::Remote => false,
            ResolveStrategy::Manual => {
                return Err(SyncError::ManualResolutionRequired {
                    count: conflicts.len(),
                })
            }
        };

        let mut resolved = Vec::with_capacity(conflicts.len());
        for conflict in conflicts {
            resolved.push(self.resolve_conflict(conflict, use_local).await?);
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{Article, SyncMetadata, SyncableRecord};
    use crate::sync::detect::ConflictDetector;
    use crate::sync::memory::MemoryTransport;

    fn context() -> RequestContext {
        RequestContext {
            user_id: "user-1".to_string(),
            device_id: "device-1".to_string(),
            bearer_token: "token".to_string(),
        }
    }

    fn metadata(device_id: &str) -> SyncMetadata {
        SyncMetadata {
            user_id: "user-1".to_string(),
            device_id: device_id.to_string(),
            timestamp: 0,
            version: 1,
        }
    }

    fn article(id: &str, content: &str, updated_at: i64) -> Article {
        Article {
            id: id.to_string(),
            title: id.to_string(),
            content: content.to_string(),
            category_id: None,
            created_at: 0,
            updated_at,
            is_deleted: false,
        }
    }

    fn seeded(remote: &Article) -> MemoryTransport {
        let transport = MemoryTransport::new();
        transport
            .seed("articles", &[SyncableRecord::new(remote.clone(), metadata("phone"))])
            .unwrap();
        transport
    }

    #[tokio::test]
    async fn resolve_with_local_clears_conflict_on_next_detect() {
        let local = article("a1", "mine", 100);
        let remote = article("a1", "theirs", 200);
        let transport = seeded(&remote);
        let context = context();
        let detector = ConflictDetector::new(metadata("device-1"));

        let pulled = transport.pull::<Article>("articles", &context).await.unwrap();
        let conflict = detector.detect(std::slice::from_ref(&local), &pulled).remove(0);

        let resolver = ConflictResolver::new(&transport, &context);
        let resolved = resolver.resolve_conflict(conflict, true).await.unwrap();
        assert!(resolved.resolved);
        assert_eq!(resolved.resolution, Some(ConflictSide::Local));
        assert_eq!(transport.push_one_calls(), 1);
        assert_eq!(transport.push_batch_calls(), 0);

        let pulled = transport.pull::<Article>("articles", &context).await.unwrap();
        assert_eq!(pulled[0].record.content, "mine");
        assert!(detector.detect(&[local], &pulled).is_empty());
    }

    #[tokio::test]
    async fn resolve_with_remote_pushes_remote_version() {
        let local = article("a1", "mine", 100);
        let remote = article("a1", "theirs", 200);
        let transport = seeded(&remote);
        let context = context();

        let conflict = SyncConflict::new(
            SyncableRecord::new(local, metadata("device-1")),
            SyncableRecord::new(remote.clone(), metadata("phone")),
        );
        let resolved = ConflictResolver::new(&transport, &context)
            .resolve_conflict(conflict, false)
            .await
            .unwrap();

        assert_eq!(resolved.winning_version().map(|v| &v.record), Some(&remote));
        let pulled = transport.pull::<Article>("articles", &context).await.unwrap();
        assert_eq!(pulled[0].record, remote);
    }

    #[tokio::test]
    async fn transport_failure_leaves_conflict_open() {
        let remote = article("a1", "theirs", 200);
        let transport = seeded(&remote);
        transport.fail_next_push("server down");
        let context = context();

        let conflict = SyncConflict::new(
            SyncableRecord::new(article("a1", "mine", 100), metadata("device-1")),
            SyncableRecord::new(remote, metadata("phone")),
        );
        let error = ConflictResolver::new(&transport, &context)
            .resolve_conflict(conflict, true)
            .await
            .unwrap_err();
        assert!(matches!(error, SyncError::Transport(_)));

        let pulled = transport.pull::<Article>("articles", &context).await.unwrap();
        assert_eq!(pulled[0].record.content, "theirs");
    }

    #[tokio::test]
    async fn resolve_all_refuses_manual_strategy() {
        let transport = MemoryTransport::new();
        let context = context();
        let conflicts = vec![SyncConflict::new(
            SyncableRecord::new(article("a1", "mine", 1), metadata("d")),
            SyncableRecord::new(article("a1", "theirs", 2), metadata("p")),
        )];

        let resolver = ConflictResolver::new(&transport, &context);
        let error = resolver
            .resolve_all(conflicts.clone(), ResolveStrategy::Manual)
            .await
            .unwrap_err();
        assert!(matches!(error, SyncError::ManualResolutionRequired { count: 1 }));
        assert_eq!(transport.push_one_calls(), 0);

        let resolved = resolver
            .resolve_all(conflicts, ResolveStrategy::Local)
            .await
            .unwrap();
        assert!(resolved.iter().all(|conflict| conflict.resolved));
        assert_eq!(transport.push_one_calls(), 1);
    }
}
