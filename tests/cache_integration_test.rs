//! Integration tests for the cache wired to file storage and a gateway.

use async_trait::async_trait;
use chrono::NaiveDate;
use repopulse::cache::{CacheError, RepoInfoCache};
use repopulse::gateway::{
    GatewayFactory, GatewayRegistry, GatewayResult, RepoMetricsGateway, SampledSeries,
};
use repopulse::model::RepoSource;
use repopulse::storage::JsonFileStorage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

/// Gateway double with fixed metrics and a shared fetch counter.
struct FixedGateway {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl RepoMetricsGateway for FixedGateway {
    async fn open_pull_requests_count(&self) -> GatewayResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(5)
    }

    async fn closed_pull_requests_count(&self) -> GatewayResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(10)
    }

    async fn users_count(&self) -> GatewayResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(15)
    }

    async fn oldest_pull_request_date(&self) -> GatewayResult<Option<NaiveDate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(NaiveDate::from_ymd_opt(2024, 1, 1))
    }

    async fn open_pull_requests_timeseries(&self) -> GatewayResult<SampledSeries> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut series = SampledSeries::new();
        series.insert(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 5);
        series.insert(NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(), 10);
        Ok(series)
    }

    async fn closed_pull_requests_timeseries(&self) -> GatewayResult<SampledSeries> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SampledSeries::new())
    }

    async fn users_timeseries(&self) -> GatewayResult<SampledSeries> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SampledSeries::new())
    }
}

fn fixed_registry(calls: Arc<AtomicUsize>) -> GatewayRegistry {
    let factory: GatewayFactory = Arc::new(move |_owner, _repo| {
        let gateway: Arc<dyn RepoMetricsGateway> = Arc::new(FixedGateway {
            calls: Arc::clone(&calls),
        });
        gateway
    });
    let mut registry = GatewayRegistry::new();
    registry.register("github", factory);
    registry
}

fn source() -> RepoSource {
    RepoSource::new("github", "torvalds", "linux")
}

#[tokio::test]
async fn test_fetch_persists_normalized_series() {
    let dir = tempdir().unwrap();
    let storage = Arc::new(JsonFileStorage::open(dir.path().join("records.json")).unwrap());
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = RepoInfoCache::new(storage, fixed_registry(calls), Duration::from_secs(3600));

    let record = cache.get_or_fetch(&source()).await.unwrap();

    assert_eq!(record.open_prs_count, 5);
    // Exactly the two sampled points, unchanged, no interpolation.
    assert_eq!(record.open_prs.len(), 2);
    assert_eq!(record.open_prs[0].date, "2024-01-01");
    assert_eq!(record.open_prs[0].value, 5);
    assert_eq!(record.open_prs[1].date, "2024-01-08");
    assert_eq!(record.open_prs[1].value, 10);
    // Empty raw mappings stay empty.
    assert!(record.closed_prs.is_empty());
    assert!(record.users.is_empty());
}

#[tokio::test]
async fn test_cached_record_survives_process_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("records.json");
    let calls = Arc::new(AtomicUsize::new(0));

    let first_record = {
        let storage = Arc::new(JsonFileStorage::open(&path).unwrap());
        let cache = RepoInfoCache::new(
            storage,
            fixed_registry(Arc::clone(&calls)),
            Duration::from_secs(3600),
        );
        cache.get_or_fetch(&source()).await.unwrap()
    };
    assert_eq!(calls.load(Ordering::SeqCst), 7);

    // A fresh storage instance on the same file serves the stored record
    // without touching the gateway again.
    let storage = Arc::new(JsonFileStorage::open(&path).unwrap());
    let cache = RepoInfoCache::new(
        storage,
        fixed_registry(Arc::clone(&calls)),
        Duration::from_secs(3600),
    );
    let second_record = cache.get_or_fetch(&source()).await.unwrap();

    assert_eq!(first_record, second_record);
    assert_eq!(calls.load(Ordering::SeqCst), 7);
}

#[tokio::test]
async fn test_zero_ttl_always_refetches_and_replaces() {
    let dir = tempdir().unwrap();
    let storage = Arc::new(JsonFileStorage::open(dir.path().join("records.json")).unwrap());
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = RepoInfoCache::new(
        storage.clone(),
        fixed_registry(Arc::clone(&calls)),
        Duration::from_secs(0),
    );

    let first = cache.get_or_fetch(&source()).await.unwrap();
    let second = cache.get_or_fetch(&source()).await.unwrap();

    // The stale record was deleted before the new one was created.
    assert_eq!(storage.len(), 1);
    assert!(second.id > first.id);
    assert_eq!(calls.load(Ordering::SeqCst), 14);
}

#[tokio::test]
async fn test_get_by_ids_returns_cached_records() {
    let dir = tempdir().unwrap();
    let storage = Arc::new(JsonFileStorage::open(dir.path().join("records.json")).unwrap());
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = RepoInfoCache::new(storage, fixed_registry(calls), Duration::from_secs(3600));

    let stored = cache.get_or_fetch(&source()).await.unwrap();
    let records = cache
        .get_by_ids(&[stored.id, stored.id, 999])
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0], stored);
}

#[tokio::test]
async fn test_unknown_provider_is_rejected() {
    let dir = tempdir().unwrap();
    let storage = Arc::new(JsonFileStorage::open(dir.path().join("records.json")).unwrap());
    let cache = RepoInfoCache::new(
        storage,
        fixed_registry(Arc::new(AtomicUsize::new(0))),
        Duration::from_secs(3600),
    );

    let result = cache
        .get_or_fetch(&RepoSource::new("bitbucket", "o", "r"))
        .await;
    assert!(matches!(result, Err(CacheError::UnsupportedProvider(_))));
}
