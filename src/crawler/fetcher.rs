//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client (user agent, timeout, connection pool)
//! - Consulting the robots policy before every page request
//! - Retrying transient failures through [`RetryPolicy`]
//! - Error classification

use crate::config::{CrawlerConfig, RetryConfig};
use crate::crawler::retry::{parse_retry_after, Attempt, RetryPolicy};
use crate::robots::PolicyHandle;
use crate::{FetchCause, FetchError};
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::Client;
use std::time::Duration;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct PageContent {
    /// The URL that was requested
    pub url: String,

    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status_code: u16,

    /// Content-Type header value
    pub content_type: Option<String>,

    /// Page body content
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// The client is shared by every worker; its connection pool keeps up to
/// `pool-size` idle connections to the crawled host.
///
/// # Example
///
/// ```no_run
/// use tidewalk::config::{CrawlerConfig, RetryConfig};
/// use tidewalk::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default(), &RetryConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    retry: &RetryConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(crawler.user_agent.as_str())
        .timeout(Duration::from_secs(retry.timeout_secs))
        .pool_max_idle_per_host(retry.pool_size)
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP session with retry/backoff that honours the crawl's robots policy
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
    policy: PolicyHandle,
    robots_agent: String,
}

impl Fetcher {
    /// Creates a fetcher from configuration, with no robots policy installed
    pub fn new(crawler: &CrawlerConfig, retry: &RetryConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(crawler, retry)?;
        Ok(Self::with_client(
            client,
            RetryPolicy::from(retry),
            &crawler.robots_agent,
        ))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, retry: RetryPolicy, robots_agent: &str) -> Self {
        Self {
            client,
            retry,
            policy: PolicyHandle::Absent,
            robots_agent: robots_agent.to_string(),
        }
    }

    /// Installs the robots policy consulted by [`fetch`](Self::fetch)
    pub fn install_policy(&mut self, policy: PolicyHandle) {
        self.policy = policy;
    }

    /// The installed robots policy
    pub fn policy(&self) -> &PolicyHandle {
        &self.policy
    }

    /// The retry policy applied to every request
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Returns true if the robots policy lets this crawler fetch `url`
    pub fn is_allowed(&self, url: &str) -> bool {
        self.policy.is_allowed(url, &self.robots_agent)
    }

    /// Fetches a page, checking robots.txt first
    ///
    /// # Returns
    ///
    /// * `Ok(PageContent)` - A 2xx response and its body
    /// * `Err(FetchError::RobotsDisallowed)` - The policy forbids the URL; no request was sent
    /// * `Err(FetchError::FetchFailed)` - Retries exhausted or a permanent failure
    pub async fn fetch(&self, url: &str) -> Result<PageContent, FetchError> {
        if !self.is_allowed(url) {
            return Err(FetchError::RobotsDisallowed {
                url: url.to_string(),
            });
        }

        self.fetch_unchecked(url)
            .await
            .map_err(|cause| FetchError::FetchFailed {
                url: url.to_string(),
                cause,
            })
    }

    /// Fetches a URL with retries but without consulting robots.txt
    ///
    /// Used for robots.txt itself.
    pub async fn fetch_unchecked(&self, url: &str) -> Result<PageContent, FetchCause> {
        let client = &self.client;

        let response = self
            .retry
            .run(url, move || async move {
                match client.get(url).send().await {
                    Ok(response) => {
                        let retry_after = response
                            .headers()
                            .get(RETRY_AFTER)
                            .and_then(|v| v.to_str().ok())
                            .and_then(parse_retry_after);
                        Attempt::Response {
                            status: response.status().as_u16(),
                            retry_after,
                            value: response,
                        }
                    }
                    Err(e) => Attempt::TransportError(classify_error(&e)),
                }
            })
            .await?;

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .text()
            .await
            .map_err(|e| FetchCause::Body(e.to_string()))?;

        Ok(PageContent {
            url: url.to_string(),
            final_url,
            status_code,
            content_type,
            body,
        })
    }
}

/// Maps a reqwest error onto a fetch cause
fn classify_error(error: &reqwest::Error) -> FetchCause {
    if error.is_timeout() {
        FetchCause::Timeout
    } else if error.is_connect() {
        FetchCause::Connect
    } else {
        FetchCause::Transport(error.to_string())
    }
}
