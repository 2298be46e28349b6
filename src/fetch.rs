//! Retrieval of recent hashtag tweets from the search API.
//!
//! [`Fetcher`] pages through results of a [`SearchClient`], running each page
//! request under a [`RetryPolicy`]. Only timeouts are retried; any other
//! failure aborts the whole fetch and no partial data is returned.

use std::time::Duration;

use chrono::{Days, NaiveDate};
use serde::Deserialize;

use crate::error::FetchError;
use crate::logging::{PipelineEvent, Reporter};
use crate::model::RawRecord;

/// Environment variable holding the API bearer token.
pub const BEARER_TOKEN_VAR: &str = "TWITTER_BEARER_TOKEN";

/// Base URL of the v1.1 REST API.
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com/1.1";

const SEARCH_PATH: &str = "/search/tweets.json";

/// A search for tweets carrying one hashtag in a date window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub q: String,
    pub lang: Option<String>,
    /// Tweets per page (the API caps this at 100).
    pub count: u32,
}

impl SearchQuery {
    /// Tweets tagged `#target` from the `days` days before `today`.
    #[must_use]
    pub fn last_days(target: &str, days: u64, today: NaiveDate) -> Self {
        let since = today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
        let tag = target.trim_start_matches('#');
        Self {
            q: format!(
                "#{tag} since:{} until:{}",
                since.format("%Y-%m-%d"),
                today.format("%Y-%m-%d")
            ),
            lang: None,
            count: 100,
        }
    }

    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        let lang = lang.into();
        self.lang = (!lang.is_empty()).then_some(lang);
        self
    }

    #[must_use]
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count.clamp(1, 100);
        self
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub records: Vec<RawRecord>,
    /// Query string for the following page, if any.
    pub next: Option<String>,
}

/// Wire shape of `search/tweets.json`.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    statuses: Vec<RawRecord>,
    #[serde(default)]
    search_metadata: SearchMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct SearchMetadata {
    next_results: Option<String>,
}

impl From<SearchResponse> for SearchPage {
    fn from(response: SearchResponse) -> Self {
        Self {
            records: response.statuses,
            next: response
                .search_metadata
                .next_results
                .filter(|next| !next.is_empty()),
        }
    }
}

/// Anything that can answer a single search page request.
pub trait SearchClient {
    /// Fetch the first page (`cursor == None`) or the page `cursor` points to.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`]; [`FetchError::is_transient`] tells the caller
    /// whether to retry.
    fn search_page(&self, query: &SearchQuery, cursor: Option<&str>)
    -> Result<SearchPage, FetchError>;
}

/// [`SearchClient`] over HTTPS with bearer-token auth.
pub struct HttpSearchClient {
    http: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl HttpSearchClient {
    /// Build a client with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the TLS backend cannot be initialised.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tweetstats/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Build a client using the token from [`BEARER_TOKEN_VAR`].
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::MissingCredentials`] when the variable is unset
    /// or empty.
    pub fn from_env(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let token = std::env::var(BEARER_TOKEN_VAR)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or(FetchError::MissingCredentials {
                var: BEARER_TOKEN_VAR,
            })?;
        Self::new(base_url, token, timeout)
    }
}

impl SearchClient for HttpSearchClient {
    fn search_page(
        &self,
        query: &SearchQuery,
        cursor: Option<&str>,
    ) -> Result<SearchPage, FetchError> {
        let request = match cursor {
            // next_results already carries every query parameter
            Some(next) => self.http.get(format!("{}{SEARCH_PATH}{next}", self.base_url)),
            None => {
                let mut params: Vec<(&str, String)> = vec![
                    ("q", query.q.clone()),
                    ("count", query.count.to_string()),
                    ("result_type", "recent".to_string()),
                ];
                if let Some(lang) = &query.lang {
                    params.push(("lang", lang.clone()));
                }
                self.http
                    .get(format!("{}{SEARCH_PATH}", self.base_url))
                    .query(&params)
            }
        };

        let response = request.bearer_auth(&self.token).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: SearchResponse = response.json()?;
        Ok(body.into())
    }
}

/// Fixed-delay retry of transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (at least 1).
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// `op` receives the 1-based attempt number.
    ///
    /// # Errors
    ///
    /// Returns the first non-transient error unchanged, or
    /// [`FetchError::RetriesExhausted`] wrapping the last transient error.
    pub fn run<T>(
        &self,
        reporter: &dyn Reporter,
        mut op: impl FnMut(u32) -> Result<T, FetchError>,
    ) -> Result<T, FetchError> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => {
                    if attempt >= max_attempts {
                        return Err(FetchError::RetriesExhausted {
                            attempts: attempt,
                            last: Box::new(err),
                        });
                    }
                    reporter.report(&PipelineEvent::FetchRetry {
                        attempt,
                        max_attempts,
                        error: err.to_string(),
                    });
                    if !self.delay.is_zero() {
                        std::thread::sleep(self.delay);
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Pages through a search, retrying each page under a [`RetryPolicy`].
pub struct Fetcher<C> {
    client: C,
    retry: RetryPolicy,
    max_pages: usize,
}

impl<C: SearchClient> Fetcher<C> {
    pub fn new(client: C, retry: RetryPolicy, max_pages: usize) -> Self {
        Self {
            client,
            retry,
            max_pages: max_pages.max(1),
        }
    }

    /// Collect every tweet the search returns, in page order.
    ///
    /// # Errors
    ///
    /// Any page failing (after retries) aborts the fetch; records from earlier
    /// pages are discarded.
    pub fn fetch_all(
        &self,
        query: &SearchQuery,
        reporter: &dyn Reporter,
    ) -> Result<Vec<RawRecord>, FetchError> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        for page_number in 1..=self.max_pages {
            let page = self
                .retry
                .run(reporter, |_| self.client.search_page(query, cursor.as_deref()))
                .inspect_err(|err| {
                    reporter.report(&PipelineEvent::FetchFailed {
                        error: err.to_string(),
                    });
                })?;

            reporter.report(&PipelineEvent::FetchedPage {
                page: page_number,
                records: page.records.len(),
            });
            records.extend(page.records);

            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(records)
    }
}
