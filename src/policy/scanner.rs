//! Link scanners
//!
//! This module extracts the pages a document links to:
//! - [`AnchorScanner`] follows `<a href>` targets
//! - [`CanonicalLinkScanner`] follows `<link rel="canonical">` targets
//!
//! Both share one [`LinkRules`] value that decides which resolved links are
//! admissible.

use crate::config::ScannerConfig;
use crate::frontier::Frontier;
use crate::page::{Document, Page};
use crate::policy::filter::{DenyPathFilter, FilterParamFilter, LinkFilter};
use crate::policy::LinkScanner;
use crate::url::is_same_authority;
use scraper::Selector;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Admission rules shared by every scanner of a crawl
///
/// A link is admitted when it resolves against the source page, is HTTP(S),
/// has exactly the crawl host and port, and no filter rejects it.
pub struct LinkRules {
    host: String,
    port: Option<u16>,
    filters: Vec<Box<dyn LinkFilter>>,
}

impl LinkRules {
    /// Creates rules for `host` on its scheme's default port, with no filters
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into().to_lowercase(),
            port: None,
            filters: Vec::new(),
        }
    }

    /// Requires links to name `port` explicitly (`None` for the default port)
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Adds a filter
    pub fn with_filter(mut self, filter: Box<dyn LinkFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Builds the rules described by a scanner configuration
    ///
    /// # Arguments
    ///
    /// * `host` - The host links must match exactly
    /// * `config` - Deny paths and filter parameters
    /// * `frontier` - Pages discovered so far, consulted by the filter-parameter rule
    pub fn from_config(
        host: impl Into<String>,
        config: &ScannerConfig,
        frontier: Arc<Frontier>,
    ) -> Self {
        let mut rules = Self::new(host);

        if !config.deny_paths.is_empty() {
            rules = rules.with_filter(Box::new(DenyPathFilter::new(config.deny_paths.clone())));
        }

        if !config.filter_params.is_empty() {
            rules = rules.with_filter(Box::new(
                FilterParamFilter::new(config.filter_params.iter().cloned()).with_seen(frontier),
            ));
        }

        rules
    }

    /// The host links must match
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Resolves `href` against `base` and returns the page if it is admissible
    pub fn admit(&self, href: &str, base: &Url) -> Option<Page> {
        let url = resolve_link(href, base)?;

        if !is_same_authority(&url, &self.host, self.port) {
            return None;
        }

        if let Some(filter) = self.filters.iter().find(|f| f.rejects(&url)) {
            tracing::trace!("{} rejected by {}", url, filter.name());
            return None;
        }

        Some(Page::new(url))
    }
}

impl fmt::Debug for LinkRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filters: Vec<&str> = self.filters.iter().map(|f| f.name()).collect();
        f.debug_struct("LinkRules")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("filters", &filters)
            .finish()
    }
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded:
/// - empty and fragment-only hrefs
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - hrefs that cannot be resolved
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    // Skip empty hrefs
    if href.is_empty() {
        return None;
    }

    // Skip special schemes
    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    // Skip same page anchors
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => Some(absolute_url),
        Err(e) => {
            tracing::debug!("Skipping malformed link '{}' on {}: {}", href, base_url, e);
            None
        }
    }
}

/// Collects admissible `href` targets of the elements matching `selector`
fn scan_hrefs<F>(
    rules: &LinkRules,
    selector: &Selector,
    source: &Page,
    document: &Document,
    skip: F,
) -> Vec<Page>
where
    F: Fn(&scraper::ElementRef<'_>) -> bool,
{
    document
        .select(selector)
        .filter(|element| !skip(element))
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| rules.admit(href, source.url()))
        .collect()
}

const ANCHOR_SELECTOR: &str = "a[href]";
const CANONICAL_SELECTOR: &str = "link[rel='canonical'][href]";

/// Follows `<a href>` targets, skipping `download` anchors
#[derive(Debug, Clone)]
pub struct AnchorScanner {
    rules: Arc<LinkRules>,
}

impl AnchorScanner {
    pub fn new(rules: Arc<LinkRules>) -> Self {
        Self { rules }
    }
}

impl LinkScanner for AnchorScanner {
    fn name(&self) -> &str {
        "anchor"
    }

    fn scan(&self, source: &Page, document: &Document) -> Vec<Page> {
        let Ok(selector) = Selector::parse(ANCHOR_SELECTOR) else {
            return Vec::new();
        };

        scan_hrefs(&self.rules, &selector, source, document, |element| {
            element.value().attr("download").is_some()
        })
    }
}

/// Follows `<link rel="canonical">` targets
#[derive(Debug, Clone)]
pub struct CanonicalLinkScanner {
    rules: Arc<LinkRules>,
}

impl CanonicalLinkScanner {
    pub fn new(rules: Arc<LinkRules>) -> Self {
        Self { rules }
    }
}

impl LinkScanner for CanonicalLinkScanner {
    fn name(&self) -> &str {
        "canonical"
    }

    fn scan(&self, source: &Page, document: &Document) -> Vec<Page> {
        let Ok(selector) = Selector::parse(CANONICAL_SELECTOR) else {
            return Vec::new();
        };

        scan_hrefs(&self.rules, &selector, source, document, |_| false)
    }
}
