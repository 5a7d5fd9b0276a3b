use crate::url::{extract_host, parse_root};
use serde::Deserialize;
use std::time::Duration;

/// Account-specific paths that never lead to new product content
pub const DEFAULT_DENY_PATHS: &[&str] = &["/sendfriend", "/customer/wishlist/add/p/"];

/// Listing filters: sort, pagination, colour, size, price range, rating,
/// gender and occasion
pub const DEFAULT_FILTER_PARAMS: &[&str] = &[
    "sort", "dir", "page", "color", "size", "price", "rating", "gender", "occasion",
];

/// Main configuration structure for Price-Sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    pub price: PriceConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// The page the crawl starts from
    #[serde(rename = "root-url")]
    pub root_url: String,

    /// Host that links must match exactly (defaults to the root URL's host)
    #[serde(default)]
    pub host: Option<String>,

    /// Number of workers fetching pages in parallel
    #[serde(rename = "pool-size", default = "default_pool_size")]
    pub pool_size: usize,

    /// Attempts per page when the failure is transient
    #[serde(rename = "max-fetch-retries", default = "default_max_fetch_retries")]
    pub max_fetch_retries: u32,

    /// Upper bound on a single fetch attempt (milliseconds)
    #[serde(
        rename = "fetch-timeout-millis",
        default = "default_fetch_timeout_millis"
    )]
    pub fetch_timeout_millis: u64,
}

impl CrawlerConfig {
    /// The host the crawl is restricted to
    ///
    /// Returns the configured host, or the root URL's host when none is set.
    pub fn effective_host(&self) -> Option<String> {
        match &self.host {
            Some(host) => Some(host.to_lowercase()),
            None => parse_root(&self.root_url)
                .ok()
                .and_then(|url| extract_host(&url)),
        }
    }

    /// The per-attempt fetch timeout
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_millis)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
        }
    }
}

/// Link scanning rules
#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    /// Path prefixes that are never followed
    #[serde(rename = "deny-paths", default = "default_deny_paths")]
    pub deny_paths: Vec<String>,

    /// Query keys that only filter a listing; links carrying nothing else are
    /// skipped. An empty list turns the rule off.
    #[serde(rename = "filter-params", default = "default_filter_params")]
    pub filter_params: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            deny_paths: default_deny_paths(),
            filter_params: default_filter_params(),
        }
    }
}

/// Price analysis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PriceConfig {
    /// Lowest price considered plausible
    pub min: f64,

    /// Highest price considered plausible
    pub max: f64,

    /// Path suffix that marks a product detail page
    #[serde(rename = "product-suffix", default = "default_product_suffix")]
    pub product_suffix: String,
}

fn default_pool_size() -> usize {
    8
}

fn default_max_fetch_retries() -> u32 {
    3
}

fn default_fetch_timeout_millis() -> u64 {
    5000
}

fn default_crawler_name() -> String {
    "PriceSweep".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_deny_paths() -> Vec<String> {
    DEFAULT_DENY_PATHS.iter().map(|s| s.to_string()).collect()
}

fn default_filter_params() -> Vec<String> {
    DEFAULT_FILTER_PARAMS.iter().map(|s| s.to_string()).collect()
}

fn default_product_suffix() -> String {
    ".html".to_string()
}
