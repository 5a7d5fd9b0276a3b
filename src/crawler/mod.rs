//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Workers that fetch, scan and analyse one page at a time
//! - The dispatcher that feeds workers and decides when the crawl is over

mod dispatcher;
mod fetcher;
#[cfg(test)]
pub(crate) mod testing;
mod worker;

pub use dispatcher::Dispatcher;
pub use fetcher::{
    build_http_client, fetch_with_retry, AbandonReason, FailureClass, FetchError, FetchOutcome,
    Fetcher, HttpFetcher,
};
pub use worker::{
    CrawlContext, CycleOutcome, Worker, WorkerError, WorkerEvent, WorkerHandle, WorkerState,
    DEFAULT_MAX_ATTEMPTS,
};

pub use crate::output::CrawlSummary;

use crate::config::Config;
use crate::frontier::Frontier;
use crate::output::{CountingSink, FindingSink};
use crate::policy::{AnchorScanner, CanonicalLinkScanner, LinkRules};
use crate::price::PriceAnalyser;
use crate::url::parse_root;
use crate::{Result, SweepError, UrlError};
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP fetcher
/// 2. Build the link rules, scanners and price analyser
/// 3. Spawn the worker pool
/// 4. Crawl from the root URL until the frontier is exhausted
/// 5. Return the crawl summary, including finding totals
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `sink` - Where analyser findings are reported
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl completed
/// * `Err(SweepError)` - Crawl could not start
pub async fn crawl(config: &Config, sink: Arc<dyn FindingSink>) -> Result<CrawlSummary> {
    let fetcher = HttpFetcher::from_config(config)?;
    let (context, counting) = build_context(config, sink, fetcher)?;

    let dispatcher = Dispatcher::initialize(context, config.crawler.pool_size)?;
    let mut summary = dispatcher.crawl(&config.crawler.root_url).await?;
    summary.findings = counting.counts();

    Ok(summary)
}

/// Assembles the crawl context described by a configuration
///
/// # Returns
///
/// The context and the counting sink wrapping `sink`, whose totals end up in
/// the crawl summary
pub fn build_context<F: Fetcher>(
    config: &Config,
    sink: Arc<dyn FindingSink>,
    fetcher: F,
) -> Result<(CrawlContext<F>, CountingSink)> {
    let invalid_root = |source: UrlError| SweepError::InvalidRoot {
        url: config.crawler.root_url.clone(),
        source,
    };
    let root = parse_root(&config.crawler.root_url).map_err(invalid_root)?;
    let host = config
        .crawler
        .effective_host()
        .ok_or_else(|| invalid_root(UrlError::MissingHost))?;

    let frontier = Arc::new(Frontier::new());
    let rules = Arc::new(
        LinkRules::from_config(host, &config.scanner, Arc::clone(&frontier)).with_port(root.port()),
    );
    tracing::debug!("Link rules: {:?}", rules);

    let counting = CountingSink::new(sink);
    let analyser = PriceAnalyser::from_config(&config.price, Arc::new(counting.clone()));

    let context = CrawlContext::new(fetcher)
        .with_frontier(frontier)
        .with_max_attempts(config.crawler.max_fetch_retries)
        .with_scanner(Box::new(AnchorScanner::new(Arc::clone(&rules))))
        .with_scanner(Box::new(CanonicalLinkScanner::new(rules)))
        .with_analyser(Box::new(analyser));

    Ok((context, counting))
}
