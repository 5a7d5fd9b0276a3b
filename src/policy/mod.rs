//! Pluggable crawl policies
//!
//! This module defines the two extension points a crawl is configured with:
//! - [`LinkScanner`]: finds the pages a document links to
//! - [`PageAnalyser`]: inspects a fetched document and reports findings
//!
//! Both run synchronously on a parsed [`Document`] inside a worker cycle.

mod filter;
mod scanner;

pub use filter::{DenyPathFilter, FilterParamFilter, LinkFilter};
pub use scanner::{AnchorScanner, CanonicalLinkScanner, LinkRules};

use crate::page::{Document, Page};
use std::collections::HashSet;

/// Extracts candidate pages from a fetched document
///
/// Implementations must only return pages that pass their admission rules.
/// A link that cannot be resolved is skipped, never reported as an error.
pub trait LinkScanner: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Returns the admissible pages linked from `document`, in document order
    fn scan(&self, source: &Page, document: &Document) -> Vec<Page>;
}

/// Inspects a fetched document
///
/// Analysers observe only. They never mutate the frontier or the document,
/// and report what they find to whatever sink they were built with.
pub trait PageAnalyser: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Analyses one page
    fn analyse(&self, page: &Page, document: &Document);
}

/// Runs every scanner over a document and merges their output
///
/// Pages are deduplicated by canonical identity. The first occurrence wins,
/// so the result follows scanner order and then document order.
pub fn scan_all(scanners: &[Box<dyn LinkScanner>], source: &Page, document: &Document) -> Vec<Page> {
    let mut seen = HashSet::new();
    let mut pages = Vec::new();

    for scanner in scanners {
        let found = scanner.scan(source, document);
        tracing::trace!("{} found {} links on {}", scanner.name(), found.len(), source);

        for page in found {
            if seen.insert(page.canonical().to_string()) {
                pages.push(page);
            }
        }
    }

    pages
}
