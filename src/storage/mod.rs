//! Record storage
//!
//! A small keyed record store behind an async trait: in-memory for tests
//! and ephemeral runs, JSON-file backed for durable runs. Both backends own
//! their index as instance state with an explicit lifecycle; there is no
//! process-wide shared index.

pub mod file;
pub mod memory;

pub use file::JsonFileStorage;
pub use memory::MemoryStorage;

use crate::model::{RepoInfoDraft, RepoInfoFilter, RepoInfoPatch, RepoInfoRecord};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding failure: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Keyed record store for [`RepoInfoRecord`]s.
///
/// Lookups that find nothing return `None`/`false` rather than erroring;
/// "not stored yet" is an expected condition.
#[async_trait]
pub trait RepoInfoStorage: Send + Sync {
    /// Persist a new record, assigning its id and creation timestamp.
    async fn create_one(&self, draft: RepoInfoDraft) -> StorageResult<RepoInfoRecord>;

    /// Fetch a record by id.
    async fn get_one(&self, id: u64) -> StorageResult<Option<RepoInfoRecord>>;

    /// Fetch records matching the filter, in id order, with pagination.
    async fn get_many(
        &self,
        filter: Option<&RepoInfoFilter>,
        skip: usize,
        limit: usize,
    ) -> StorageResult<Vec<RepoInfoRecord>>;

    /// Apply a field-level patch; returns the updated record, or `None` if
    /// the id is unknown.
    async fn update_one(
        &self,
        id: u64,
        patch: RepoInfoPatch,
    ) -> StorageResult<Option<RepoInfoRecord>>;

    /// Delete a record by id; `true` if it existed.
    async fn delete_one(&self, id: u64) -> StorageResult<bool>;
}

/// The record index both backends operate on.
///
/// Ids are allocated from a monotonically increasing counter so deleting a
/// record can never cause a later creation to reuse its id.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct RecordIndex {
    records: BTreeMap<u64, RepoInfoRecord>,
    next_id: u64,
}

impl RecordIndex {
    pub(crate) fn create(&mut self, draft: RepoInfoDraft) -> RepoInfoRecord {
        self.next_id += 1;
        let record = draft.into_record(self.next_id, Utc::now());
        self.records.insert(record.id, record.clone());
        record
    }

    pub(crate) fn get(&self, id: u64) -> Option<RepoInfoRecord> {
        self.records.get(&id).cloned()
    }

    pub(crate) fn select(
        &self,
        filter: Option<&RepoInfoFilter>,
        skip: usize,
        limit: usize,
    ) -> Vec<RepoInfoRecord> {
        self.records
            .values()
            .filter(|record| filter.map_or(true, |f| f.matches(record)))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect()
    }

    pub(crate) fn update(&mut self, id: u64, patch: &RepoInfoPatch) -> Option<RepoInfoRecord> {
        let record = self.records.get_mut(&id)?;
        patch.apply(record, Utc::now());
        Some(record.clone())
    }

    pub(crate) fn remove(&mut self, id: u64) -> bool {
        self.records.remove(&id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RepoInfoFilter;

    fn draft(owner: &str, repo: &str) -> RepoInfoDraft {
        RepoInfoDraft {
            provider: "github".to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            open_prs_count: 0,
            closed_prs_count: 0,
            users_count: 0,
            oldest_pr: None,
            open_prs: vec![],
            closed_prs: vec![],
            users: vec![],
        }
    }

    #[test]
    fn test_index_ids_are_monotonic_across_deletes() {
        let mut index = RecordIndex::default();
        let first = index.create(draft("a", "one"));
        let second = index.create(draft("a", "two"));
        assert_eq!((first.id, second.id), (1, 2));

        assert!(index.remove(first.id));
        let third = index.create(draft("a", "three"));
        // Never reuses a freed id.
        assert_eq!(third.id, 3);
    }

    #[test]
    fn test_index_select_filters_and_paginates() {
        let mut index = RecordIndex::default();
        index.create(draft("a", "one"));
        index.create(draft("b", "two"));
        index.create(draft("a", "one"));

        let filter = RepoInfoFilter::by_full_name("a/one");
        let matches = index.select(Some(&filter), 0, 10);
        assert_eq!(matches.len(), 2);

        let paged = index.select(Some(&filter), 1, 10);
        assert_eq!(paged.len(), 1);

        let limited = index.select(None, 0, 2);
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_index_update_missing_id_is_none() {
        let mut index = RecordIndex::default();
        assert!(index.update(42, &Default::default()).is_none());
    }
}
