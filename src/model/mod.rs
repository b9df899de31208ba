//! Domain records for repository activity metrics.
//!
//! Defines the repository identity, the sampled timeseries data points and
//! the cached info record, together with the draft/patch/filter shapes the
//! storage layer works with.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a tracked repository on a hosting provider.
///
/// Immutable value type; its derived [`id`](RepoSource::id) is the logical
/// cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoSource {
    pub provider: String,
    pub owner: String,
    pub repo: String,
}

impl RepoSource {
    pub fn new(
        provider: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// `{owner}/{repo}`, the name records are looked up by.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// `{provider}/{owner}/{repo}`, the globally unique logical key.
    pub fn id(&self) -> String {
        format!("{}/{}/{}", self.provider, self.owner, self.repo)
    }
}

impl fmt::Display for RepoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// One sampled point of a metric timeseries.
///
/// The date carries no time-of-day component; values are cumulative counts
/// and therefore never negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeseriesDataPoint {
    /// Calendar date in `YYYY-MM-DD` form.
    pub date: String,
    /// Metric value at this date.
    pub value: u64,
}

impl TimeseriesDataPoint {
    pub fn new(date: NaiveDate, value: u64) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            value,
        }
    }
}

/// A cached repository info record as held by the storage layer.
///
/// Created once by the cache after a gateway round-trip; afterwards only
/// `updated_at` moves (on field-level updates). `created_at` never mutates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoInfoRecord {
    /// Storage-assigned identifier.
    pub id: u64,
    pub provider: String,
    pub owner: String,
    pub repo: String,
    pub open_prs_count: u64,
    pub closed_prs_count: u64,
    pub users_count: u64,
    /// Creation date of the oldest pull request, if the repository has any.
    pub oldest_pr: Option<NaiveDate>,
    pub open_prs: Vec<TimeseriesDataPoint>,
    pub closed_prs: Vec<TimeseriesDataPoint>,
    pub users: Vec<TimeseriesDataPoint>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl RepoInfoRecord {
    /// The identity this record was fetched for.
    pub fn source(&self) -> RepoSource {
        RepoSource::new(&self.provider, &self.owner, &self.repo)
    }

    /// `{owner}/{repo}`, matching [`RepoSource::full_name`].
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Age of this record for freshness checks.
    ///
    /// Measured as `(updated_at otherwise now) - created_at`, i.e. age since
    /// creation rather than time since the last refresh.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.updated_at.unwrap_or(now) - self.created_at
    }

    /// Whole days elapsed since the oldest pull request was opened.
    pub fn days_since_oldest_pr(&self) -> Option<i64> {
        self.oldest_pr
            .map(|oldest| (Local::now().date_naive() - oldest).num_days())
    }
}

/// Payload for creating a [`RepoInfoRecord`]; the storage backend assigns
/// the id and the creation timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoInfoDraft {
    pub provider: String,
    pub owner: String,
    pub repo: String,
    pub open_prs_count: u64,
    pub closed_prs_count: u64,
    pub users_count: u64,
    pub oldest_pr: Option<NaiveDate>,
    pub open_prs: Vec<TimeseriesDataPoint>,
    pub closed_prs: Vec<TimeseriesDataPoint>,
    pub users: Vec<TimeseriesDataPoint>,
}

impl RepoInfoDraft {
    /// Materialize the draft into a stored record.
    pub fn into_record(self, id: u64, created_at: DateTime<Utc>) -> RepoInfoRecord {
        RepoInfoRecord {
            id,
            provider: self.provider,
            owner: self.owner,
            repo: self.repo,
            open_prs_count: self.open_prs_count,
            closed_prs_count: self.closed_prs_count,
            users_count: self.users_count,
            oldest_pr: self.oldest_pr,
            open_prs: self.open_prs,
            closed_prs: self.closed_prs,
            users: self.users,
            created_at,
            updated_at: None,
        }
    }
}

/// Field-level update for a stored record. Unset fields are left alone;
/// applying any patch stamps `updated_at`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepoInfoPatch {
    pub open_prs_count: Option<u64>,
    pub closed_prs_count: Option<u64>,
    pub users_count: Option<u64>,
    pub oldest_pr: Option<NaiveDate>,
    pub open_prs: Option<Vec<TimeseriesDataPoint>>,
    pub closed_prs: Option<Vec<TimeseriesDataPoint>>,
    pub users: Option<Vec<TimeseriesDataPoint>>,
}

impl RepoInfoPatch {
    pub fn apply(&self, record: &mut RepoInfoRecord, now: DateTime<Utc>) {
        if let Some(count) = self.open_prs_count {
            record.open_prs_count = count;
        }
        if let Some(count) = self.closed_prs_count {
            record.closed_prs_count = count;
        }
        if let Some(count) = self.users_count {
            record.users_count = count;
        }
        if let Some(oldest) = self.oldest_pr {
            record.oldest_pr = Some(oldest);
        }
        if let Some(series) = &self.open_prs {
            record.open_prs = series.clone();
        }
        if let Some(series) = &self.closed_prs {
            record.closed_prs = series.clone();
        }
        if let Some(series) = &self.users {
            record.users = series.clone();
        }
        record.updated_at = Some(now);
    }
}

/// Typed record filter with named optional fields; no reflection involved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepoInfoFilter {
    /// Exact match on the record's `{owner}/{repo}` name.
    pub full_name: Option<String>,
}

impl RepoInfoFilter {
    pub fn by_full_name(full_name: impl Into<String>) -> Self {
        Self {
            full_name: Some(full_name.into()),
        }
    }

    pub fn matches(&self, record: &RepoInfoRecord) -> bool {
        match &self.full_name {
            Some(name) => record.full_name() == *name,
            None => true,
        }
    }
}

/// A live counts-only snapshot fetched straight from the gateway,
/// bypassing cache and storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub provider: String,
    pub owner: String,
    pub repo: String,
    pub open_prs_count: u64,
    pub closed_prs_count: u64,
    pub users_count: u64,
    pub oldest_pr: Option<NaiveDate>,
}
