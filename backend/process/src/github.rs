//! # GitHub
//!
//! REST client backing [`Source`].
//!
//! ## Queries
//! - `GET /orgs/{org}/repos?per_page=100&page=n`
//! - `GET /search/issues?q=repo:{owner/repo} is:pr is:merged&per_page=100&page=n`
//!
//! ## Pagination
//! - Repository listing keeps going until a short page
//! - Search also stops once `total_count` items are in, or at the 1000 result ceiling
//!
//! ## Retries
//! - Transport errors and 5xx are retried with linear backoff
//! - Rate limits are never retried, the caller decides what to skip
use std::time::Duration;

use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap},
};
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{
    error::FetchError,
    models::{self, PER_PAGE, PullRequest, Repository, SEARCH_RESULT_LIMIT, SearchResponse},
    source::Source,
    utils::merged_query,
};

#[derive(Debug, Clone, Copy)]
pub struct Retry {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GitHub {
    client: Client,
    base_url: String,
    token: Option<String>,
    retry: Retry,
}

impl GitHub {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(models::USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            retry: Retry::default(),
        })
    }

    pub fn with_retry(mut self, retry: Retry) -> Self {
        self.retry = retry;
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let mut attempt = 1;

        loop {
            match self.get_once(url, query).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.retry.attempts => {
                    let delay = self.retry.base_delay * attempt;
                    warn!("Attempt {attempt} for {url} failed: {e}, retrying in {delay:?}");

                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, models::ACCEPT)
            .query(query);

        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {token}"));
        }

        let response = request.send().await?;
        let status = response.status();

        if is_rate_limited(status, response.headers()) {
            return Err(FetchError::RateLimited {
                reset: rate_limit_reset(response.headers()),
            });
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;

        Ok(serde_json::from_slice(&body)?)
    }
}

impl Source for GitHub {
    async fn list_repositories(&self, organization: &str) -> Result<Vec<Repository>, FetchError> {
        let url = format!("{}/orgs/{organization}/repos", self.base_url);
        let mut repositories = Vec::new();
        let mut page = 1;

        loop {
            let batch: Vec<Repository> = self.get_json(&url, &page_query(page)).await?;
            let batch_len = batch.len();
            repositories.extend(batch);

            if !has_next_listing(batch_len) {
                break;
            }

            page += 1;
        }

        debug!("Listed {} repositories for {organization}", repositories.len());
        Ok(repositories)
    }

    async fn merged_pull_requests(&self, full_name: &str) -> Result<Vec<PullRequest>, FetchError> {
        let url = format!("{}/search/issues", self.base_url);
        let mut pull_requests = Vec::new();
        let mut page = 1;

        loop {
            let mut query = vec![("q", merged_query(full_name))];
            query.extend(page_query(page));

            let response: SearchResponse = self.get_json(&url, &query).await?;

            if response.incomplete_results {
                warn!("Search results for {full_name} are incomplete");
            }

            let batch_len = response.items.len();
            pull_requests.extend(response.items);

            if !has_next_search(page, batch_len, pull_requests.len(), response.total_count) {
                break;
            }

            page += 1;
        }

        Ok(pull_requests)
    }
}

fn page_query(page: usize) -> Vec<(&'static str, String)> {
    vec![("per_page", PER_PAGE.to_string()), ("page", page.to_string())]
}

fn has_next_listing(batch_len: usize) -> bool {
    batch_len == PER_PAGE
}

fn has_next_search(page: usize, batch_len: usize, collected: usize, total_count: usize) -> bool {
    batch_len == PER_PAGE && collected < total_count && page * PER_PAGE < SEARCH_RESULT_LIMIT
}

fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    match status {
        StatusCode::TOO_MANY_REQUESTS => true,
        StatusCode::FORBIDDEN => {
            header_str(headers, "x-ratelimit-remaining") == Some("0")
                || headers.contains_key("retry-after")
        }
        _ => false,
    }
}

fn rate_limit_reset(headers: &HeaderMap) -> Option<u64> {
    header_str(headers, "x-ratelimit-reset")?.parse().ok()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}
