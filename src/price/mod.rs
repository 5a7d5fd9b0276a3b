//! Price extraction and range validation
//!
//! Product detail pages carry their prices as RDFa: a `.prd-price` element
//! holding a `gr:hasCurrencyValue` amount and a `gr:hasCurrency` code. The
//! [`PriceAnalyser`] reads those and flags every price outside the configured
//! range.

mod analyser;
mod types;

pub use analyser::{extract_prices, PriceAnalyser};
pub use types::{Currency, InvalidAmount, Price, PriceRange, UnknownCurrency, Verdict};
