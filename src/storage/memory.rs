//! In-memory record storage.

use super::{RecordIndex, RepoInfoStorage, StorageResult};
use crate::model::{RepoInfoDraft, RepoInfoFilter, RepoInfoPatch, RepoInfoRecord};
use async_trait::async_trait;
use parking_lot::RwLock;

/// Volatile storage backend; records live for the lifetime of the instance.
///
/// Each instance owns its own index, so independent stores can coexist in
/// one process (and in tests).
#[derive(Debug, Default)]
pub struct MemoryStorage {
    index: RwLock<RecordIndex>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RepoInfoStorage for MemoryStorage {
    async fn create_one(&self, draft: RepoInfoDraft) -> StorageResult<RepoInfoRecord> {
        Ok(self.index.write().create(draft))
    }

    async fn get_one(&self, id: u64) -> StorageResult<Option<RepoInfoRecord>> {
        Ok(self.index.read().get(id))
    }

    async fn get_many(
        &self,
        filter: Option<&RepoInfoFilter>,
        skip: usize,
        limit: usize,
    ) -> StorageResult<Vec<RepoInfoRecord>> {
        Ok(self.index.read().select(filter, skip, limit))
    }

    async fn update_one(
        &self,
        id: u64,
        patch: RepoInfoPatch,
    ) -> StorageResult<Option<RepoInfoRecord>> {
        Ok(self.index.write().update(id, &patch))
    }

    async fn delete_one(&self, id: u64) -> StorageResult<bool> {
        Ok(self.index.write().remove(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(repo: &str) -> RepoInfoDraft {
        RepoInfoDraft {
            provider: "github".to_string(),
            owner: "owner".to_string(),
            repo: repo.to_string(),
            open_prs_count: 4,
            closed_prs_count: 8,
            users_count: 2,
            oldest_pr: None,
            open_prs: vec![],
            closed_prs: vec![],
            users: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_created_at() {
        let storage = MemoryStorage::new();
        let record = storage.create_one(draft("r")).await.unwrap();
        assert_eq!(record.id, 1);
        assert!(record.updated_at.is_none());
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn test_get_one_missing_is_none() {
        let storage = MemoryStorage::new();
        assert!(storage.get_one(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_many_by_full_name() {
        let storage = MemoryStorage::new();
        storage.create_one(draft("one")).await.unwrap();
        storage.create_one(draft("two")).await.unwrap();

        let filter = RepoInfoFilter::by_full_name("owner/two");
        let records = storage.get_many(Some(&filter), 0, 100).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].repo, "two");
    }

    #[tokio::test]
    async fn test_update_one_sets_updated_at() {
        let storage = MemoryStorage::new();
        let record = storage.create_one(draft("r")).await.unwrap();

        let patch = RepoInfoPatch {
            users_count: Some(42),
            ..RepoInfoPatch::default()
        };
        let updated = storage.update_one(record.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.users_count, 42);
        assert!(updated.updated_at.is_some());
        // created_at never mutates.
        assert_eq!(updated.created_at, record.created_at);
    }

    #[tokio::test]
    async fn test_delete_one() {
        let storage = MemoryStorage::new();
        let record = storage.create_one(draft("r")).await.unwrap();
        assert!(storage.delete_one(record.id).await.unwrap());
        assert!(!storage.delete_one(record.id).await.unwrap());
        assert!(storage.is_empty());
    }
}
