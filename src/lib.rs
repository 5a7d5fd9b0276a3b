//! Price-Sweep: a single-site price anomaly crawler
//!
//! This crate crawls one web host breadth-first with a bounded pool of workers,
//! deduplicating pages by canonical URL, and runs pluggable analysers (price
//! range validation) over every page it fetches.

pub mod config;
pub mod crawler;
pub mod frontier;
pub mod output;
pub mod page;
pub mod policy;
pub mod price;
pub mod url;

use thiserror::Error;

/// Main error type for Price-Sweep operations
///
/// Only start-up failures surface here. Anything that goes wrong while a
/// single page is being processed is absorbed inside the worker that owns it.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid root URL '{url}': {source}")]
    InvalidRoot { url: String, source: UrlError },

    #[error("Worker pool size must be at least 1, got {0}")]
    InvalidPoolSize(usize),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("All {0} workers stopped before the crawl finished")]
    WorkerPoolLost(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid host: {0}")]
    InvalidHost(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Price-Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, CrawlSummary, Dispatcher};
pub use frontier::Frontier;
pub use page::{Document, Page};
pub use crate::url::{canonicalize, canonicalize_url};
