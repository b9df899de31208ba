//! GitHub gateway adapter
//!
//! Translates the GitHub REST API into the [`RepoMetricsGateway`] contract.
//! Listing endpoints are paginated with hard page caps so a busy repository
//! cannot make a fetch unbounded; the weekly series are reconstructed from
//! the raw pull request and commit events by the samplers.

use super::registry::GatewayFactory;
use super::{GatewayError, GatewayResult, RepoMetricsGateway, SampledSeries};
use crate::timeseries::{
    closed_pull_request_series, contributor_series, open_pull_request_series, CommitEvent,
    PullRequestEvent, SamplingWindow, MAX_COMMITS_SAMPLED,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use reqwest::header;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

const GITHUB_API_BASE: &str = "https://api.github.com";
const PER_PAGE: usize = 100;
const MAX_PULL_PAGES: usize = 10;
const MAX_CONTRIBUTOR_PAGES: usize = 10;
const MAX_COMMIT_PAGES: usize = MAX_COMMITS_SAMPLED / PER_PAGE;
const USER_AGENT: &str = concat!("repopulse/", env!("CARGO_PKG_VERSION"));

/// GitHub REST API adapter for one repository.
pub struct GithubGateway {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
    owner: String,
    repo: String,
}

impl GithubGateway {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, token: Option<String>) -> Self {
        Self::with_api_base(GITHUB_API_BASE, owner, repo, token)
    }

    /// Point the adapter at a non-default API base (GitHub Enterprise, or a
    /// local test server).
    pub fn with_api_base(
        api_base: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        let api_base: String = api_base.into();
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Factory for the provider registry, capturing token and API base.
    pub fn factory(token: Option<String>, api_base: Option<String>) -> GatewayFactory {
        let api_base = api_base.unwrap_or_else(|| GITHUB_API_BASE.to_string());
        Arc::new(move |owner, repo| {
            let gateway: Arc<dyn RepoMetricsGateway> = Arc::new(Self::with_api_base(
                api_base.clone(),
                owner,
                repo,
                token.clone(),
            ));
            gateway
        })
    }

    fn repo_url(&self, resource: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, resource
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> GatewayResult<T> {
        debug!("GET {}", url);
        let mut request = self
            .client
            .get(url.as_str())
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::status(status.as_u16(), url));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::decode(e.to_string()))
    }

    /// Fetch one listing endpoint page by page until a short page or the
    /// page cap is reached.
    async fn list_paged<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &str,
        max_pages: usize,
    ) -> GatewayResult<Vec<T>> {
        let mut items = Vec::new();
        for page in 1..=max_pages {
            let url = format!(
                "{}?{}per_page={}&page={}",
                self.repo_url(resource),
                query,
                PER_PAGE,
                page
            );
            let batch: Vec<T> = self.get_json(url).await?;
            let len = batch.len();
            items.extend(batch);
            if len < PER_PAGE {
                break;
            }
        }
        Ok(items)
    }

    async fn search_pull_count(&self, state: &str) -> GatewayResult<u64> {
        let url = format!(
            "{}/search/issues?q=repo:{}/{}+type:pr+state:{}&per_page=1",
            self.api_base, self.owner, self.repo, state
        );
        let result: SearchCount = self.get_json(url).await?;
        Ok(result.total_count)
    }

    async fn list_pulls(&self) -> GatewayResult<Vec<PullDto>> {
        self.list_paged("pulls", "state=all&", MAX_PULL_PAGES).await
    }

    async fn list_recent_commits(&self) -> GatewayResult<Vec<CommitDto>> {
        self.list_paged("commits", "", MAX_COMMIT_PAGES).await
    }

    async fn pull_events(&self) -> GatewayResult<Vec<PullRequestEvent>> {
        Ok(self
            .list_pulls()
            .await?
            .into_iter()
            .map(PullDto::into_event)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct SearchCount {
    total_count: u64,
}

#[derive(Debug, Deserialize)]
struct PullDto {
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
}

impl PullDto {
    fn into_event(self) -> PullRequestEvent {
        PullRequestEvent {
            created_at: self.created_at,
            closed_at: self.closed_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommitDto {
    author: Option<ActorDto>,
    commit: CommitDetailDto,
}

#[derive(Debug, Deserialize)]
struct ActorDto {
    login: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitDetailDto {
    author: Option<GitAuthorDto>,
}

#[derive(Debug, Deserialize)]
struct GitAuthorDto {
    name: Option<String>,
    date: Option<DateTime<Utc>>,
}

impl CommitDto {
    /// Commit event with the best available author identity: the GitHub
    /// login when the commit is linked to an account, otherwise the git
    /// author name. Commits without a date are dropped.
    fn into_event(self) -> Option<CommitEvent> {
        let CommitDto { author, commit } = self;
        let git_author = commit.author;
        let committed_at = git_author.as_ref().and_then(|a| a.date)?;
        let identity = author
            .and_then(|actor| actor.login)
            .or_else(|| git_author.and_then(|a| a.name));
        Some(CommitEvent {
            author: identity,
            committed_at,
        })
    }
}

/// Window for a pull request series: narrowed to the repository's lifetime
/// when the oldest fetched creation date is more recent than the default
/// lookback.
fn pull_window(events: &[PullRequestEvent]) -> SamplingWindow {
    let oldest = events
        .iter()
        .map(|event| event.created_at.date_naive())
        .min();
    SamplingWindow::ending_today(oldest)
}

#[async_trait]
impl RepoMetricsGateway for GithubGateway {
    async fn open_pull_requests_count(&self) -> GatewayResult<u64> {
        self.search_pull_count("open").await
    }

    async fn closed_pull_requests_count(&self) -> GatewayResult<u64> {
        self.search_pull_count("closed").await
    }

    async fn users_count(&self) -> GatewayResult<u64> {
        let contributors: Vec<serde_json::Value> = self
            .list_paged("contributors", "", MAX_CONTRIBUTOR_PAGES)
            .await?;
        Ok(contributors.len() as u64)
    }

    async fn oldest_pull_request_date(&self) -> GatewayResult<Option<NaiveDate>> {
        let url = format!(
            "{}?state=all&sort=created&direction=asc&per_page=1",
            self.repo_url("pulls")
        );
        let pulls: Vec<PullDto> = self.get_json(url).await?;
        Ok(pulls.first().map(|pull| pull.created_at.date_naive()))
    }

    async fn open_pull_requests_timeseries(&self) -> GatewayResult<SampledSeries> {
        let events = self.pull_events().await?;
        let window = pull_window(&events);
        Ok(open_pull_request_series(&events, &window))
    }

    async fn closed_pull_requests_timeseries(&self) -> GatewayResult<SampledSeries> {
        let events = self.pull_events().await?;
        let window = pull_window(&events);
        Ok(closed_pull_request_series(&events, &window))
    }

    async fn users_timeseries(&self) -> GatewayResult<SampledSeries> {
        let commits: Vec<CommitEvent> = self
            .list_recent_commits()
            .await?
            .into_iter()
            .filter_map(CommitDto::into_event)
            .collect();
        let window = SamplingWindow::ending_today(None);
        Ok(contributor_series(&commits, &window))
    }
}
