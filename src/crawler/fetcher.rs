//! HTTP fetcher implementation
//!
//! This module handles all page retrieval for the crawler, including:
//! - Building HTTP clients with proper user agent strings and timeouts
//! - GET requests to fetch page content
//! - Error classification into permanent and transient failures
//! - Retry logic for transient failures

use crate::config::{Config, UserAgentConfig};
use crate::page::Page;
use reqwest::{Client, StatusCode};
use std::error::Error as StdError;
use std::future::Future;
use std::io;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Upper bound on establishing a connection
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Retrieves the raw content of a page
///
/// Implementations bound every attempt in time and report failures through
/// [`FetchError`], which decides whether a retry is worthwhile.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, page: &Page) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// How a fetch failure affects retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Retrying cannot help (not found, malformed target)
    Permanent,

    /// The same request may succeed later (timeout, connection reset)
    Transient,

    /// Neither of the above; not retried, but worth a look
    Unclassified,
}

/// A failed fetch attempt
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Page not found (HTTP {0})")]
    NotFound(u16),

    #[error("Invalid fetch target: {0}")]
    InvalidTarget(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Fetch failed: {0}")]
    Other(String),
}

impl FetchError {
    /// Classifies the failure for the retry policy
    ///
    /// | Error | Class |
    /// |-------|-------|
    /// | `NotFound` (404, 410) | Permanent |
    /// | `InvalidTarget` | Permanent |
    /// | `Timeout` | Transient |
    /// | `Connection` | Transient |
    /// | `Status` (any other non-success code) | Unclassified |
    /// | `Other` | Unclassified |
    pub fn class(&self) -> FailureClass {
        match self {
            FetchError::NotFound(_) | FetchError::InvalidTarget(_) => FailureClass::Permanent,
            FetchError::Timeout | FetchError::Connection(_) => FailureClass::Transient,
            FetchError::Status(_) | FetchError::Other(_) => FailureClass::Unclassified,
        }
    }

    /// Maps a non-success HTTP status to an error
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => FetchError::NotFound(status.as_u16()),
            other => FetchError::Status(other.as_u16()),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() || e.is_request() || is_dropped_connection(&e) {
            // `is_request` covers a connection the server closed mid-exchange
            FetchError::Connection(e.to_string())
        } else if e.is_builder() {
            FetchError::InvalidTarget(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::from_status(status)
        } else {
            FetchError::Other(e.to_string())
        }
    }
}

/// Returns true if any cause of `error` is an I/O error from a connection
/// the peer reset or closed early
fn is_dropped_connection(error: &(dyn StdError + 'static)) -> bool {
    let mut cause = Some(error);

    while let Some(current) = cause {
        if let Some(io) = current.downcast_ref::<io::Error>() {
            if matches!(
                io.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }
        cause = current.source();
    }

    false
}

/// Why a page was given up on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbandonReason {
    /// A permanent failure; no retry was attempted
    Permanent,

    /// Every attempt failed transiently
    RetriesExhausted,

    /// An unclassified failure; no retry was attempted
    Unclassified,
}

/// Result of fetching a page with retries
#[derive(Debug)]
pub enum FetchOutcome {
    /// The page content, and how many attempts it took
    Fetched { body: String, attempts: u32 },

    /// The page was given up on
    Abandoned(AbandonReason),
}

/// Fetches a page, retrying transient failures
///
/// Up to `max_attempts` attempts are made, back to back. Permanent and
/// unclassified failures end the loop immediately. Failures never propagate:
/// the caller always gets an outcome and the crawl moves on.
///
/// # Arguments
///
/// * `fetcher` - The fetcher to use
/// * `page` - The page to fetch
/// * `max_attempts` - Total attempts allowed (values below 1 are treated as 1)
pub async fn fetch_with_retry<F: Fetcher>(fetcher: &F, page: &Page, max_attempts: u32) -> FetchOutcome {
    let max_attempts = max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match fetcher.fetch(page).await {
            Ok(body) => {
                tracing::debug!("Fetched {} ({} bytes, attempt {})", page, body.len(), attempt);
                return FetchOutcome::Fetched {
                    body,
                    attempts: attempt,
                };
            }
            Err(e) => match e.class() {
                FailureClass::Permanent => {
                    tracing::debug!("Skipping {}: {}", page, e);
                    return FetchOutcome::Abandoned(AbandonReason::Permanent);
                }
                FailureClass::Unclassified => {
                    tracing::warn!("Unexpected failure fetching {}: {}", page, e);
                    return FetchOutcome::Abandoned(AbandonReason::Unclassified);
                }
                FailureClass::Transient => {
                    tracing::debug!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        max_attempts,
                        page,
                        e
                    );
                }
            },
        }
    }

    tracing::warn!(
        "Giving up on {} after {} attempts",
        page,
        max_attempts
    );
    FetchOutcome::Abandoned(AbandonReason::RetriesExhausted)
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Upper bound on a whole request, including reading the body
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use price_sweep::config::UserAgentConfig;
/// use price_sweep::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "PriceSweep".to_string(),
///     crawler_version: "1.0".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(5)).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages over HTTP(S) with `reqwest`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from the user agent and timeout settings
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.user_agent, config.crawler.fetch_timeout())?;
        Ok(Self::new(client))
    }

    async fn get(&self, url: &Url) -> Result<String, FetchError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidTarget(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::from_status(status));
        }

        Ok(response.text().await?)
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, page: &Page) -> Result<String, FetchError> {
        self.get(page.url()).await
    }
}
