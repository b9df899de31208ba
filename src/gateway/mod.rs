//! Hosting-provider gateway contract
//!
//! The capability surface a provider adapter must satisfy. The core depends
//! only on this trait; pagination, rate limits and authentication are the
//! adapter's concern.

pub mod github;
pub mod registry;

pub use github::GithubGateway;
pub use registry::{GatewayFactory, GatewayRegistry};

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

/// Raw sampled series as returned by a gateway: date → cumulative count.
pub type SampledSeries = BTreeMap<NaiveDate, u64>;

/// Errors raised by gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure (connection, TLS, timeout).
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-success status code.
    #[error("provider returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// The provider's response body did not match the expected shape.
    #[error("malformed provider response: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn status(status: u16, url: impl Into<String>) -> Self {
        Self::Status {
            status,
            url: url.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Repository metrics as exposed by a hosting provider.
///
/// An implementation is constructed for one `{owner}/{repo}` pair and
/// answers counts plus raw weekly-sampled series. All operations may
/// suspend on network I/O and may fail with [`GatewayError`]; the caller
/// does not retry.
#[async_trait]
pub trait RepoMetricsGateway: Send + Sync {
    /// Number of currently open pull requests.
    async fn open_pull_requests_count(&self) -> GatewayResult<u64>;

    /// Number of closed pull requests.
    async fn closed_pull_requests_count(&self) -> GatewayResult<u64>;

    /// Number of contributors.
    async fn users_count(&self) -> GatewayResult<u64>;

    /// Creation date of the repository's oldest pull request, if any.
    async fn oldest_pull_request_date(&self) -> GatewayResult<Option<NaiveDate>>;

    /// Weekly net-open pull request counts over the sampling window.
    async fn open_pull_requests_timeseries(&self) -> GatewayResult<SampledSeries>;

    /// Weekly cumulative closed pull request counts over the window.
    async fn closed_pull_requests_timeseries(&self) -> GatewayResult<SampledSeries>;

    /// Weekly cumulative contributor counts over the window.
    async fn users_timeseries(&self) -> GatewayResult<SampledSeries>;
}
