//! Weekly cumulative sampling of repository events.
//!
//! All dates are truncated to whole days before comparison so that
//! time-of-day and timezone components cannot shift a sample point.

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

/// Days between consecutive sample points.
pub const SAMPLE_INTERVAL_DAYS: i64 = 7;

/// Default historical window when no oldest-known date narrows it.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// Upper bound on commits consumed by the contributor sampler.
pub const MAX_COMMITS_SAMPLED: usize = 200;

/// A pull request's lifecycle timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestEvent {
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// A single commit with its author identity, when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEvent {
    pub author: Option<String>,
    pub committed_at: DateTime<Utc>,
}

/// The `[start, end]` range a series is reconstructed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl SamplingWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start > end {
            Self { start: end, end }
        } else {
            Self { start, end }
        }
    }

    /// Window ending at today's local midnight, reaching back one year.
    ///
    /// An oldest-known date later than the one-year default narrows the
    /// window to the repository's actual lifetime; an earlier one is
    /// ignored (the lookback is capped at one year).
    pub fn ending_today(oldest_known: Option<NaiveDate>) -> Self {
        Self::with_end(Local::now().date_naive(), oldest_known)
    }

    /// Same derivation as [`ending_today`](Self::ending_today) with an
    /// explicit end date.
    pub fn with_end(end: NaiveDate, oldest_known: Option<NaiveDate>) -> Self {
        let default_start = end - Duration::days(DEFAULT_LOOKBACK_DAYS);
        let start = match oldest_known {
            Some(oldest) if oldest > default_start => oldest,
            _ => default_start,
        };
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Sample dates from `start` to `end` inclusive, every 7 days. The last
    /// point may land exactly on `end` but never beyond it.
    pub fn sample_dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        let mut current = self.start;
        std::iter::from_fn(move || {
            if current > end {
                return None;
            }
            let date = current;
            current = current + Duration::days(SAMPLE_INTERVAL_DAYS);
            Some(date)
        })
    }
}

/// Net-open pull request count at each weekly sample point.
///
/// At each point the value is the number of pull requests opened on or
/// before that date minus those of them already closed by it, clamped at
/// zero. An empty event list yields an empty series rather than a
/// zero-filled one.
pub fn open_pull_request_series(
    events: &[PullRequestEvent],
    window: &SamplingWindow,
) -> BTreeMap<NaiveDate, u64> {
    let mut series = BTreeMap::new();
    if events.is_empty() {
        return series;
    }

    let mut lifecycle: Vec<(NaiveDate, Option<NaiveDate>)> = events
        .iter()
        .map(|event| {
            (
                event.created_at.date_naive(),
                event.closed_at.map(|closed| closed.date_naive()),
            )
        })
        .collect();
    lifecycle.sort_by_key(|(created, _)| *created);

    let mut next = 0;
    let mut opened: u64 = 0;
    let mut closed: u64 = 0;
    // Min-heap of closure dates for pull requests already counted as opened.
    let mut pending_closes: BinaryHeap<Reverse<NaiveDate>> = BinaryHeap::new();

    for sample in window.sample_dates() {
        while next < lifecycle.len() && lifecycle[next].0 <= sample {
            opened += 1;
            if let Some(closed_on) = lifecycle[next].1 {
                pending_closes.push(Reverse(closed_on));
            }
            next += 1;
        }
        while let Some(&Reverse(closed_on)) = pending_closes.peek() {
            if closed_on > sample {
                break;
            }
            pending_closes.pop();
            closed += 1;
        }
        series.insert(sample, opened.saturating_sub(closed));
    }
    series
}

/// Cumulative closed pull request count at each weekly sample point.
///
/// Only events with a closure date participate; none of them closed means
/// an empty series.
pub fn closed_pull_request_series(
    events: &[PullRequestEvent],
    window: &SamplingWindow,
) -> BTreeMap<NaiveDate, u64> {
    let mut closed_dates: Vec<NaiveDate> = events
        .iter()
        .filter_map(|event| event.closed_at)
        .map(|closed| closed.date_naive())
        .collect();

    let mut series = BTreeMap::new();
    if closed_dates.is_empty() {
        return series;
    }
    closed_dates.sort_unstable();

    let mut next = 0;
    let mut total: u64 = 0;
    for sample in window.sample_dates() {
        while next < closed_dates.len() && closed_dates[next] <= sample {
            total += 1;
            next += 1;
        }
        series.insert(sample, total);
    }
    series
}

/// Cumulative distinct contributor count at each weekly sample point.
///
/// Consumes at most [`MAX_COMMITS_SAMPLED`] of the given (most recent
/// first) commits, keeps each author's earliest commit date inside the
/// window, and counts authors whose first contribution is on or before the
/// sample date. Commits without an author identity are skipped.
pub fn contributor_series(
    commits: &[CommitEvent],
    window: &SamplingWindow,
) -> BTreeMap<NaiveDate, u64> {
    let mut first_contribution: HashMap<&str, NaiveDate> = HashMap::new();
    for commit in commits.iter().take(MAX_COMMITS_SAMPLED) {
        let Some(author) = commit.author.as_deref() else {
            continue;
        };
        let day = commit.committed_at.date_naive();
        if day < window.start() || day > window.end() {
            continue;
        }
        first_contribution
            .entry(author)
            .and_modify(|first| {
                if day < *first {
                    *first = day;
                }
            })
            .or_insert(day);
    }

    let mut series = BTreeMap::new();
    if first_contribution.is_empty() {
        return series;
    }

    let mut first_dates: Vec<NaiveDate> = first_contribution.into_values().collect();
    first_dates.sort_unstable();

    let mut next = 0;
    let mut total: u64 = 0;
    for sample in window.sample_dates() {
        while next < first_dates.len() && first_dates[next] <= sample {
            total += 1;
            next += 1;
        }
        series.insert(sample, total);
    }
    series
}
