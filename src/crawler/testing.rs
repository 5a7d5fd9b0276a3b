//! In-memory site used by crawler unit tests

use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::page::Page;
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves pages from a map keyed by canonical URL
///
/// Unknown pages are not found. Every fetch is counted per page.
#[derive(Debug, Default)]
pub struct SiteFetcher {
    pages: HashMap<String, String>,
    flaky: HashMap<String, usize>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl SiteFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, canonical: &str, body: &str) -> Self {
        self.pages.insert(canonical.to_string(), body.to_string());
        self
    }

    /// Makes the first `failures` fetches of a page time out
    pub fn with_flaky_page(mut self, canonical: &str, body: &str, failures: usize) -> Self {
        self.flaky.insert(canonical.to_string(), failures);
        self.with_page(canonical, body)
    }

    /// How many times a page was fetched
    pub fn fetch_count(&self, canonical: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .get(canonical)
            .copied()
            .unwrap_or(0)
    }

    /// Total fetches across all pages
    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().unwrap().values().sum()
    }

    fn record(&self, canonical: &str) -> usize {
        let mut fetches = self.fetches.lock().unwrap();
        let count = fetches.entry(canonical.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}

impl Fetcher for SiteFetcher {
    async fn fetch(&self, page: &Page) -> Result<String, FetchError> {
        tokio::task::yield_now().await;

        let attempt = self.record(page.canonical());
        if let Some(failures) = self.flaky.get(page.canonical()) {
            if attempt <= *failures {
                return Err(FetchError::Timeout);
            }
        }

        self.pages
            .get(page.canonical())
            .cloned()
            .ok_or(FetchError::NotFound(404))
    }
}
