//! Crawl summary reporting
//!
//! This module holds the totals a finished crawl reports and prints them
//! for the operator.

use crate::output::findings::FindingCounts;
use chrono::{DateTime, Utc};

/// Totals for one finished crawl
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    /// Canonical root the crawl started from
    pub root_url: String,

    /// Number of workers the crawl ran with
    pub pool_size: usize,

    /// Distinct pages ever inserted into the frontier
    pub discovered: usize,

    /// Pages still waiting when the crawl ended (zero for a finished crawl)
    pub unvisited: usize,

    /// Pages dispatched to a worker
    pub visited: usize,

    /// Pages fetched and parsed
    pub fetched: usize,

    /// Pages abandoned after a permanent failure (not found, bad target)
    pub abandoned_permanent: usize,

    /// Pages abandoned after every attempt failed transiently
    pub abandoned_after_retries: usize,

    /// Pages abandoned after a failure that is neither permanent nor transient
    pub abandoned_unclassified: usize,

    /// Cycles whose scanning or analysis panicked
    pub panicked: usize,

    /// What the analysers reported
    pub findings: FindingCounts,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlSummary {
    /// Wall-clock duration of the crawl
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Total pages abandoned for any reason
    pub fn abandoned(&self) -> usize {
        self.abandoned_permanent + self.abandoned_after_retries + self.abandoned_unclassified
    }

    /// Returns true if nothing was left waiting in the frontier
    pub fn is_complete(&self) -> bool {
        self.unvisited == 0
    }
}

/// Prints a crawl summary to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The summary to display
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Overview:");
    println!("  Root: {}", summary.root_url);
    println!("  Workers: {}", summary.pool_size);
    println!(
        "  Started: {}",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "  Duration: {:.1}s",
        summary.duration().num_milliseconds() as f64 / 1000.0
    );
    println!();

    println!("Pages:");
    println!("  Discovered: {}", summary.discovered);
    println!("  Visited: {}", summary.visited);
    println!("  Fetched: {}", summary.fetched);
    println!("  Unvisited: {}", summary.unvisited);
    println!();

    if summary.abandoned() > 0 || summary.panicked > 0 {
        println!("Abandoned:");
        println!("  Permanent failure: {}", summary.abandoned_permanent);
        println!("  Retries exhausted: {}", summary.abandoned_after_retries);
        println!("  Unclassified failure: {}", summary.abandoned_unclassified);
        println!("  Panicked: {}", summary.panicked);
        println!();
    }

    println!("Prices:");
    println!("  Checked: {}", summary.findings.prices_checked);
    println!("  Out of range: {}", summary.findings.out_of_range);
    println!(
        "  Product pages without price: {}",
        summary.findings.pages_without_price
    );
    println!();

    let success_rate = if summary.visited > 0 {
        (summary.fetched as f64 / summary.visited as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} pages successfully fetched)",
        success_rate, summary.fetched, summary.visited
    );
}
