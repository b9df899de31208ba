//! JSON-file-backed record storage.

use super::{RecordIndex, RepoInfoStorage, StorageResult};
use crate::model::{RepoInfoDraft, RepoInfoFilter, RepoInfoPatch, RepoInfoRecord};
use async_trait::async_trait;
use log::{debug, info};
use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};

/// Durable storage backend persisting the record index as a JSON file.
///
/// The whole index is loaded at open and rewritten after every mutation via
/// a temp-file rename, so a crashed write never leaves a half-written store
/// behind. One instance owns one file; open a second instance on a
/// different path for an independent store.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    index: RwLock<RecordIndex>,
}

impl JsonFileStorage {
    /// Open the store at `path`, creating parent directories as needed and
    /// starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let index = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let index: RecordIndex = serde_json::from_str(&content)?;
            debug!(
                "Loaded {} record(s) from storage file {}",
                index.len(),
                path.display()
            );
            index
        } else {
            info!("Starting with empty storage at {}", path.display());
            RecordIndex::default()
        };

        Ok(Self {
            path,
            index: RwLock::new(index),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, index: &RecordIndex) -> StorageResult<()> {
        let content = serde_json::to_string_pretty(index)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl RepoInfoStorage for JsonFileStorage {
    async fn create_one(&self, draft: RepoInfoDraft) -> StorageResult<RepoInfoRecord> {
        let mut index = self.index.write();
        let record = index.create(draft);
        self.persist(&index)?;
        Ok(record)
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
        let mut index = self.index.write();
        let updated = index.update(id, &patch);
        if updated.is_some() {
            self.persist(&index)?;
        }
        Ok(updated)
    }

    async fn delete_one(&self, id: u64) -> StorageResult<bool> {
        let mut index = self.index.write();
        let removed = index.remove(id);
        if removed {
            self.persist(&index)?;
        }
        Ok(removed)
    }
}
