//! Link filters
//!
//! A filter vetoes links that are on the crawl host but not worth fetching.

use crate::frontier::Frontier;
use crate::url::{canonicalize_url, has_only_keys_from};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// A rule that can veto an otherwise admissible link
pub trait LinkFilter: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Returns true if the link must not be followed
    fn rejects(&self, url: &Url) -> bool;
}

/// Rejects links whose path starts with one of a set of prefixes
///
/// # Example
///
/// ```
/// use price_sweep::policy::{DenyPathFilter, LinkFilter};
/// use url::Url;
///
/// let filter = DenyPathFilter::new(vec!["/sendfriend".to_string()]);
/// let url = Url::parse("http://www.example.com/sendfriend/product/id/1").unwrap();
/// assert!(filter.rejects(&url));
/// ```
#[derive(Debug, Clone)]
pub struct DenyPathFilter {
    prefixes: Vec<String>,
}

impl DenyPathFilter {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes }
    }
}

impl LinkFilter for DenyPathFilter {
    fn name(&self) -> &str {
        "deny-path"
    }

    fn rejects(&self, url: &Url) -> bool {
        let path = url.path();
        self.prefixes.iter().any(|prefix| path.starts_with(prefix))
    }
}

/// Rejects links that only re-filter a page already discovered
///
/// A link such as `/shoes?sort=price&dir=asc` shows the same products as
/// `/shoes`. Once `/shoes` is in the frontier, following the filtered link
/// adds nothing. If `/shoes` has not been seen, the link is kept, since it
/// may be the only way to reach that listing.
///
/// Links with any query key outside the set are kept, as are links without a
/// query. Without a frontier to consult, nothing counts as seen and every
/// link is kept.
#[derive(Debug, Clone)]
pub struct FilterParamFilter {
    keys: HashSet<String>,
    seen: Option<Arc<Frontier>>,
}

impl FilterParamFilter {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            seen: None,
        }
    }

    /// Consults `frontier` to decide whether a link's page was already seen
    pub fn with_seen(mut self, frontier: Arc<Frontier>) -> Self {
        self.seen = Some(frontier);
        self
    }
}

impl LinkFilter for FilterParamFilter {
    fn name(&self) -> &str {
        "filter-param"
    }

    fn rejects(&self, url: &Url) -> bool {
        if self.keys.is_empty() || !has_only_keys_from(url, &self.keys) {
            return false;
        }

        self.seen
            .as_ref()
            .is_some_and(|frontier| frontier.contains(&canonicalize_url(url)))
    }
}
