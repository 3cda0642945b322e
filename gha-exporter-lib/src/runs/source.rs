//! Paged access to workflow runs.

use super::client::{Client, UpstreamError};
use super::record::{MalformedRecordError, RunRecord, normalize};
use crate::settings::Settings;
use futures_util::Stream;
use futures_util::stream;
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;

/// Largest page size the GitHub API honors
pub const MAX_PER_PAGE: u8 = 100;

/// Status vocabulary accepted by the run-listing `status` filter.
///
/// GitHub accepts both lifecycle states and conclusions here, which is why
/// `completed` and `success` sit side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum StatusFilter {
    Completed,
    Cancelled,
    Failure,
    Success,
    TimedOut,
    InProgress,
}

impl StatusFilter {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Filters applied to a run listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunQuery {
    pub event: String,
    pub status: Option<StatusFilter>,
}

impl RunQuery {
    #[must_use]
    pub fn new(event: impl Into<String>, status: Option<StatusFilter>) -> Self {
        Self {
            event: event.into(),
            status,
        }
    }
}

/// One page of raw run objects
#[derive(Debug, Clone)]
pub struct RunPage {
    /// Total number of runs matching the query across all pages
    pub total_count: u64,

    /// Raw run objects, normalized lazily by the consumer
    pub items: Vec<Value>,

    /// Whether another page may follow this one
    pub has_more: bool,
}

impl RunPage {
    #[must_use]
    pub fn new(total_count: u64, items: Vec<Value>, per_page: u8) -> Self {
        let has_more = items.len() >= usize::from(per_page);
        Self {
            total_count,
            items,
            has_more,
        }
    }
}

/// A paged source of workflow runs
pub trait RunSource {
    /// Fetch one page (1-based) of runs matching `query`.
    ///
    /// `per_page` is capped at [`MAX_PER_PAGE`]. Failures are not retried.
    fn fetch_page(&self, query: &RunQuery, page: u32, per_page: u8) -> impl Future<Output = Result<RunPage, UpstreamError>> + Send;
}

/// Error yielded by [`fetch_all`]
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// A whole page could not be fetched; the stream ends after this item
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// A single run could not be normalized; the stream continues
    #[error(transparent)]
    Malformed(#[from] MalformedRecordError),
}

/// Count the runs matching `query` using the listing's `total_count`.
pub async fn count_runs<S: RunSource + Sync>(source: &S, query: &RunQuery) -> Result<u64, UpstreamError> {
    Ok(source.fetch_page(query, 1, 1).await?.total_count)
}

/// Lazily page through at most `max_runs` runs, newest first.
///
/// Pages are requested starting at 1 and only when the consumer asks for an item beyond the
/// ones already buffered. Paging stops after `max_runs` items, after a short page, or after an
/// empty page. Malformed records count towards `max_runs` and are yielded as errors so the
/// consumer can skip them; an upstream failure is yielded once and ends the stream.
pub fn fetch_all<'a, S>(source: &'a S, query: &'a RunQuery, max_runs: usize) -> impl Stream<Item = Result<RunRecord, FetchError>> + Send + 'a
where
    S: RunSource + Sync,
{
    let pager = Pager {
        source,
        query,
        per_page: page_size_for(max_runs),
        next_page: 1,
        remaining: max_runs,
        buffered: VecDeque::new(),
        last_page: false,
    };

    stream::unfold(pager, |mut pager| async move {
        let item = pager.next_item().await?;
        Some((item, pager))
    })
}

#[expect(clippy::cast_possible_truncation, reason = "value is clamped to MAX_PER_PAGE")]
fn page_size_for(max_runs: usize) -> u8 {
    max_runs.clamp(1, usize::from(MAX_PER_PAGE)) as u8
}

struct Pager<'a, S> {
    source: &'a S,
    query: &'a RunQuery,
    per_page: u8,
    next_page: u32,
    remaining: usize,
    buffered: VecDeque<Value>,
    last_page: bool,
}

impl<S: RunSource + Sync> Pager<'_, S> {
    async fn next_item(&mut self) -> Option<Result<RunRecord, FetchError>> {
        loop {
            if self.remaining == 0 {
                return None;
            }

            if let Some(raw) = self.buffered.pop_front() {
                self.remaining -= 1;
                return Some(normalize(&raw).map_err(FetchError::from));
            }

            if self.last_page {
                return None;
            }

            match self.source.fetch_page(self.query, self.next_page, self.per_page).await {
                Ok(page) => {
                    if page.items.is_empty() {
                        return None;
                    }

                    self.last_page = !page.has_more || page.items.len() < usize::from(self.per_page);
                    self.next_page += 1;
                    self.buffered.extend(page.items);
                }

                Err(e) => {
                    self.remaining = 0;
                    return Some(Err(FetchError::Upstream(e)));
                }
            }
        }
    }
}

/// Listing response of `GET /repos/{owner}/{repo}/actions/workflows/{workflow}/runs`
#[derive(Debug, Deserialize)]
struct WorkflowRunsResponse {
    total_count: u64,
    #[serde(default)]
    workflow_runs: Vec<Value>,
}

/// [`RunSource`] backed by the GitHub Actions API for a single workflow file
#[derive(Debug, Clone)]
pub struct GitHubRuns {
    client: Client,
    runs_url: String,
}

impl GitHubRuns {
    pub fn new(settings: &Settings) -> crate::Result<Self> {
        let client = Client::new(settings.github_token.as_deref(), settings.github_api_url.as_str(), settings.request_timeout)?;

        let target = &settings.target;
        let runs_url = format!(
            "{}/repos/{}/{}/actions/workflows/{}/runs",
            client.base_url(),
            target.owner,
            target.repo,
            target.workflow_file
        );

        Ok(Self { client, runs_url })
    }

    #[must_use]
    pub fn runs_url(&self) -> &str {
        &self.runs_url
    }
}

impl RunSource for GitHubRuns {
    async fn fetch_page(&self, query: &RunQuery, page: u32, per_page: u8) -> Result<RunPage, UpstreamError> {
        let per_page = per_page.clamp(1, MAX_PER_PAGE);

        let mut params = vec![("event", query.event.clone())];
        if let Some(status) = query.status {
            params.push(("status", status.as_str().to_string()));
        }
        params.push(("per_page", per_page.to_string()));
        params.push(("page", page.to_string()));

        let resp: WorkflowRunsResponse = self.client.get_json(&self.runs_url, &params).await?;
        Ok(RunPage::new(resp.total_count, resp.workflow_runs, per_page))
    }
}
