//! Freshness-gated repository info cache
//!
//! Lookup-or-compute-or-refresh engine keyed by the logical repository
//! identity. A stored record is served while it is fresh; a stale record is
//! deleted and re-fetched from the provider gateway; a missing record is
//! fetched and persisted. Concurrent misses for the same key are coalesced
//! through a per-key lock so only one gateway round-trip happens.

use crate::gateway::{GatewayError, GatewayRegistry};
use crate::model::{RepoInfoDraft, RepoInfoFilter, RepoInfoRecord, RepoSource, RepoSummary};
use crate::storage::{RepoInfoStorage, StorageError};
use crate::timeseries::fill_timeseries;
use chrono::Utc;
use dashmap::DashMap;
use log::{debug, info};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

/// Default time-to-live for cached records: one hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Errors raised by cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The requested provider has no registered gateway. Raised before any
    /// storage or gateway I/O.
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// A gateway operation failed; no partial record was persisted.
    #[error(transparent)]
    Fetch(#[from] GatewayError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// TTL-gated cache over a record store and a provider gateway registry.
pub struct RepoInfoCache {
    storage: Arc<dyn RepoInfoStorage>,
    registry: GatewayRegistry,
    ttl: Duration,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl RepoInfoCache {
    pub fn new(storage: Arc<dyn RepoInfoStorage>, registry: GatewayRegistry, ttl: Duration) -> Self {
        Self {
            storage,
            registry,
            ttl,
            in_flight: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached record for `source`, fetching from the provider
    /// gateway when the record is missing or stale.
    ///
    /// A record is fresh while `(updated_at otherwise now) - created_at` is
    /// below the TTL; a stale record is deleted before re-fetching, so a
    /// failed refresh leaves the key absent rather than serving stale data.
    pub async fn get_or_fetch(&self, source: &RepoSource) -> CacheResult<RepoInfoRecord> {
        if !self.registry.is_registered(&source.provider) {
            return Err(CacheError::UnsupportedProvider(source.provider.clone()));
        }

        // One fetch per key at a time; a second caller waits and then sees
        // the record the first one stored.
        let key_lock = self.key_lock(&source.id());
        let _guard = key_lock.lock().await;

        if let Some(record) = self.lookup_fresh(source).await? {
            return Ok(record);
        }
        self.fetch_and_store(source).await
    }

    /// Fetch previously cached records by storage id. Duplicate ids are
    /// looked up once; ids with no record are dropped silently.
    pub async fn get_by_ids(&self, ids: &[u64]) -> CacheResult<Vec<RepoInfoRecord>> {
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        for &id in ids {
            if !seen.insert(id) {
                continue;
            }
            if let Some(record) = self.storage.get_one(id).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Live counts-only snapshot straight from the gateway; neither reads
    /// nor writes the store.
    pub async fn summary(&self, source: &RepoSource) -> CacheResult<RepoSummary> {
        let gateway = self
            .registry
            .create(&source.provider, &source.owner, &source.repo)
            .ok_or_else(|| CacheError::UnsupportedProvider(source.provider.clone()))?;

        let (open_prs_count, closed_prs_count, users_count, oldest_pr) = tokio::try_join!(
            gateway.open_pull_requests_count(),
            gateway.closed_pull_requests_count(),
            gateway.users_count(),
            gateway.oldest_pull_request_date(),
        )?;

        Ok(RepoSummary {
            provider: source.provider.clone(),
            owner: source.owner.clone(),
            repo: source.repo.clone(),
            open_prs_count,
            closed_prs_count,
            users_count,
            oldest_pr,
        })
    }

    fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        Arc::clone(
            self.in_flight
                .entry(key.to_string())
                .or_default()
                .value(),
        )
    }

    /// Look up the stored record for the source and return it if fresh.
    /// A stale record is deleted here so the key falls back to absent.
    async fn lookup_fresh(&self, source: &RepoSource) -> CacheResult<Option<RepoInfoRecord>> {
        let filter = RepoInfoFilter::by_full_name(source.full_name());
        let matches = self.storage.get_many(Some(&filter), 0, 1).await?;
        let Some(record) = matches.into_iter().next() else {
            return Ok(None);
        };

        let age = record.age(Utc::now());
        if age.num_seconds() < self.ttl.as_secs() as i64 {
            debug!("Cache hit for {} (age {}s)", source, age.num_seconds());
            return Ok(Some(record));
        }

        debug!(
            "Cache record for {} is stale (age {}s, ttl {}s), discarding",
            source,
            age.num_seconds(),
            self.ttl.as_secs()
        );
        let _ = self.storage.delete_one(record.id).await?;
        Ok(None)
    }

    /// Fetch all metrics from the gateway, normalize the sampled series and
    /// persist the composed record. Any gateway failure aborts the whole
    /// operation before anything is written.
    async fn fetch_and_store(&self, source: &RepoSource) -> CacheResult<RepoInfoRecord> {
        let gateway = self
            .registry
            .create(&source.provider, &source.owner, &source.repo)
            .ok_or_else(|| CacheError::UnsupportedProvider(source.provider.clone()))?;

        info!("Fetching repository metrics for {}", source);
        let (
            open_prs_count,
            closed_prs_count,
            users_count,
            oldest_pr,
            open_series,
            closed_series,
            users_series,
        ) = tokio::try_join!(
            gateway.open_pull_requests_count(),
            gateway.closed_pull_requests_count(),
            gateway.users_count(),
            gateway.oldest_pull_request_date(),
            gateway.open_pull_requests_timeseries(),
            gateway.closed_pull_requests_timeseries(),
            gateway.users_timeseries(),
        )?;

        let draft = RepoInfoDraft {
            provider: source.provider.clone(),
            owner: source.owner.clone(),
            repo: source.repo.clone(),
            open_prs_count,
            closed_prs_count,
            users_count,
            oldest_pr,
            open_prs: fill_timeseries(&open_series),
            closed_prs: fill_timeseries(&closed_series),
            users: fill_timeseries(&users_series),
        };

        let record = self.storage.create_one(draft).await?;
        info!(
            "Cached repository metrics for {} as record {}",
            source, record.id
        );
        Ok(record)
    }
}

impl std::fmt::Debug for RepoInfoCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoInfoCache")
            .field("ttl", &self.ttl)
            .field("registry", &self.registry)
            .finish()
    }
}
