//! Analyser findings and the sinks that receive them

use crate::page::Page;
use crate::price::{Price, Verdict};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Something an analyser found on a page
#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    /// A price and whether it lies in the configured range
    Price {
        page: Page,
        price: Price,
        verdict: Verdict,
    },

    /// A product page carried no readable price
    NoPriceFound { page: Page },
}

impl Finding {
    /// The page the finding was made on
    pub fn page(&self) -> &Page {
        match self {
            Finding::Price { page, .. } | Finding::NoPriceFound { page } => page,
        }
    }

    /// Returns true for a price outside the configured range
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            Finding::Price {
                verdict: Verdict::OutOfRange,
                ..
            }
        )
    }
}

/// Receives findings from analysers
///
/// Sinks are shared by every worker, so `report` may be called concurrently.
pub trait FindingSink: Send + Sync {
    fn report(&self, finding: Finding);
}

/// Logs every finding through `tracing`
///
/// Out-of-range prices are warnings; everything else is informational.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl FindingSink for TracingSink {
    fn report(&self, finding: Finding) {
        match &finding {
            Finding::Price {
                page,
                price,
                verdict: Verdict::OutOfRange,
            } => {
                tracing::warn!("Price out of range: {} on {}", price, page);
            }
            Finding::Price {
                page,
                price,
                verdict: Verdict::InRange,
            } => {
                tracing::debug!("Price found: {} on {}", price, page);
            }
            Finding::NoPriceFound { page } => {
                tracing::info!("No price found on {}", page);
            }
        }
    }
}

/// Keeps every finding in memory, in report order
#[derive(Debug, Default)]
pub struct MemorySink {
    findings: Mutex<Vec<Finding>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of everything reported so far
    pub fn findings(&self) -> Vec<Finding> {
        self.findings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// A snapshot of the out-of-range prices reported so far
    pub fn out_of_range(&self) -> Vec<Finding> {
        self.findings()
            .into_iter()
            .filter(Finding::is_out_of_range)
            .collect()
    }
}

impl FindingSink for MemorySink {
    fn report(&self, finding: Finding) {
        self.findings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(finding);
    }
}

/// Totals of the findings a crawl produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindingCounts {
    /// Prices read from product pages
    pub prices_checked: usize,

    /// Prices outside the configured range
    pub out_of_range: usize,

    /// Product pages without a readable price
    pub pages_without_price: usize,
}

/// Counts findings and forwards them to another sink
#[derive(Clone)]
pub struct CountingSink {
    inner: Arc<dyn FindingSink>,
    prices_checked: Arc<AtomicUsize>,
    out_of_range: Arc<AtomicUsize>,
    pages_without_price: Arc<AtomicUsize>,
}

impl CountingSink {
    pub fn new(inner: Arc<dyn FindingSink>) -> Self {
        Self {
            inner,
            prices_checked: Arc::new(AtomicUsize::new(0)),
            out_of_range: Arc::new(AtomicUsize::new(0)),
            pages_without_price: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Totals reported so far
    pub fn counts(&self) -> FindingCounts {
        FindingCounts {
            prices_checked: self.prices_checked.load(Ordering::Relaxed),
            out_of_range: self.out_of_range.load(Ordering::Relaxed),
            pages_without_price: self.pages_without_price.load(Ordering::Relaxed),
        }
    }
}

impl FindingSink for CountingSink {
    fn report(&self, finding: Finding) {
        match &finding {
            Finding::Price { verdict, .. } => {
                self.prices_checked.fetch_add(1, Ordering::Relaxed);
                if *verdict == Verdict::OutOfRange {
                    self.out_of_range.fetch_add(1, Ordering::Relaxed);
                }
            }
            Finding::NoPriceFound { .. } => {
                self.pages_without_price.fetch_add(1, Ordering::Relaxed);
            }
        }

        self.inner.report(finding);
    }
}
