//! Output module for crawl findings and summaries
//!
//! This module handles:
//! - Delivering analyser findings to a sink (logs, memory, counters)
//! - Reporting the totals of a finished crawl

mod findings;
mod summary;

pub use findings::{CountingSink, Finding, FindingCounts, FindingSink, MemorySink, TracingSink};
pub use summary::{print_summary, CrawlSummary};
