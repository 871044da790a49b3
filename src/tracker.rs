//! HTTP issue source for the tracker's REST search endpoint.

use crate::error::FetchError;
use crate::source::IssueSource;
use crate::types::Issue;
use ahash::AHashSet;
use serde::Deserialize;

/// Issues requested per page.
const PAGE_SIZE: usize = 100;

/// Upper bound on pages fetched in one refresh.
const MAX_PAGES: usize = 1000;

/// Response header carrying the total number of result pages.
const TOTAL_PAGES_HEADER: &str = "X-Total-Pages";

/// Connection details for the tracker API.
#[derive(Clone)]
pub struct TrackerClient {
    http: reqwest::Client,
    api_url: String,
    org_id: String,
    token: String,
}

impl std::fmt::Debug for TrackerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerClient")
            .field("api_url", &self.api_url)
            .field("org_id", &self.org_id)
            .finish_non_exhaustive()
    }
}

/// Wire shape of one issue in a search response.
#[derive(Debug, Deserialize)]
struct TrackerIssue {
    key: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    description: Option<String>,
}

impl From<TrackerIssue> for Issue {
    fn from(issue: TrackerIssue) -> Self {
        Self::new(issue.key, issue.summary, issue.description.unwrap_or_default())
    }
}

impl TrackerClient {
    pub fn new(
        api_url: impl Into<String>,
        org_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            org_id: org_id.into(),
            token: token.into(),
        }
    }

    fn search_url(&self) -> String {
        format!("{}/v2/issues/_search", self.api_url.trim_end_matches('/'))
    }

    async fn fetch_page(
        &self,
        filter: &str,
        page: usize,
    ) -> Result<(Vec<Issue>, Option<usize>), FetchError> {
        let response = self
            .http
            .post(self.search_url())
            .query(&[("perPage", PAGE_SIZE), ("page", page)])
            .header("Authorization", format!("OAuth {}", self.token))
            .header("X-Org-ID", &self.org_id)
            .json(&serde_json::json!({ "query": filter }))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let total_pages = response
            .headers()
            .get(TOTAL_PAGES_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok());

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(&e))?;
        let issues: Vec<TrackerIssue> =
            serde_json::from_slice(&body).map_err(|e| FetchError::Malformed(e.to_string()))?;

        Ok((issues.into_iter().map(Issue::from).collect(), total_pages))
    }
}

impl IssueSource for TrackerClient {
    async fn fetch(&self, filter: &str) -> Result<Vec<Issue>, FetchError> {
        if self.token.is_empty() || self.org_id.is_empty() {
            return Err(FetchError::Transport(
                "tracker token and organization id are not configured".to_string(),
            ));
        }

        let mut issues = vec![];
        let mut seen = AHashSet::new();
        let mut page = 1;

        loop {
            let (batch, total_pages) = self.fetch_page(filter, page).await?;
            let batch_len = batch.len();
            let before = issues.len();
            issues.extend(batch.into_iter().filter(|issue| seen.insert(issue.key.clone())));

            match next_page(page, total_pages, batch_len, issues.len() - before) {
                Some(next) => page = next,
                None => break,
            }
        }

        tracing::info!("Loaded {} issues from tracker ({} pages)", issues.len(), page);
        Ok(issues)
    }
}

fn transport_error(e: &reqwest::Error) -> FetchError {
    let message = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        format!("request failed: {}", e)
    };
    FetchError::Transport(message)
}

/// Decide which page to request after `page`, or `None` when done.
///
/// Without a total page count a short page ends the listing. A page that adds
/// no new keys means the server is repeating itself, so the walk stops there.
fn next_page(
    page: usize,
    total_pages: Option<usize>,
    batch_len: usize,
    new_issues: usize,
) -> Option<usize> {
    let last = match total_pages {
        Some(total) => page >= total,
        None => batch_len < PAGE_SIZE,
    };
    if last {
        return None;
    }
    if new_issues == 0 {
        tracing::warn!("Page {} repeated earlier results, stopping pagination", page);
        return None;
    }
    if page >= MAX_PAGES {
        tracing::warn!("Stopped after {} pages, results may be incomplete", MAX_PAGES);
        return None;
    }
    Some(page + 1)
}
