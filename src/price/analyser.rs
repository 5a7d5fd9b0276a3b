use crate::config::PriceConfig;
use crate::output::{Finding, FindingSink};
use crate::page::{Document, Page};
use crate::policy::PageAnalyser;
use crate::price::types::{Price, PriceRange};
use scraper::{ElementRef, Selector};
use std::sync::Arc;

const PRICE_SELECTOR: &str = ".prd-price";
const AMOUNT_SELECTOR: &str = r#"[property="gr:hasCurrencyValue"]"#;
const CURRENCY_SELECTOR: &str = r#"[property="gr:hasCurrency"]"#;

/// Extracts every price marked up on a document
///
/// # Extraction Rules
///
/// For each `.prd-price` element:
/// - the amount is the text of the first `gr:hasCurrencyValue` descendant,
///   trimmed with thousands separators removed
/// - the currency is the first `gr:hasCurrency` descendant, or none if it is
///   missing or unknown
///
/// Elements without an amount are ignored. An amount that does not parse is
/// logged and skipped; the remaining elements are still read.
///
/// # Example
///
/// ```
/// use price_sweep::page::Document;
/// use price_sweep::price::{extract_prices, Currency};
///
/// let document = Document::parse(
///     r#"<span class="prd-price">
///          <span property="gr:hasCurrencyValue">1,299.00</span>
///          <span property="gr:hasCurrency">SGD</span>
///        </span>"#,
/// );
/// let prices = extract_prices(&document);
/// assert_eq!(prices[0].amount, 1299.0);
/// assert_eq!(prices[0].currency, Some(Currency::Sgd));
/// ```
pub fn extract_prices(document: &Document) -> Vec<Price> {
    let (Ok(price_selector), Ok(amount_selector), Ok(currency_selector)) = (
        Selector::parse(PRICE_SELECTOR),
        Selector::parse(AMOUNT_SELECTOR),
        Selector::parse(CURRENCY_SELECTOR),
    ) else {
        return Vec::new();
    };

    let mut prices = Vec::new();

    for element in document.select(&price_selector) {
        let Some(amount_text) = first_text(&element, &amount_selector) else {
            continue;
        };

        let amount = match Price::parse_amount(&amount_text) {
            Ok(amount) => amount,
            Err(e) => {
                tracing::debug!("Skipping unparsable price '{}': {}", amount_text.trim(), e);
                continue;
            }
        };

        let currency = first_text(&element, &currency_selector).and_then(|code| code.parse().ok());

        prices.push(Price::new(amount, currency));
    }

    prices
}

/// Text of the first descendant matching `selector`
fn first_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|found| found.text().collect::<String>())
}

/// Flags product prices outside a configured range
pub struct PriceAnalyser {
    range: PriceRange,
    product_suffix: String,
    sink: Arc<dyn FindingSink>,
}

impl PriceAnalyser {
    /// Creates an analyser
    ///
    /// # Arguments
    ///
    /// * `range` - The plausible price range (inclusive)
    /// * `product_suffix` - Path suffix that marks a product detail page
    /// * `sink` - Where findings are reported
    pub fn new(range: PriceRange, product_suffix: impl Into<String>, sink: Arc<dyn FindingSink>) -> Self {
        Self {
            range,
            product_suffix: product_suffix.into(),
            sink,
        }
    }

    /// Creates an analyser from the `[price]` configuration
    pub fn from_config(config: &PriceConfig, sink: Arc<dyn FindingSink>) -> Self {
        Self::new(
            PriceRange::new(config.min, config.max),
            config.product_suffix.clone(),
            sink,
        )
    }

    /// Returns true if the page is a product detail page
    pub fn is_product_page(&self, page: &Page) -> bool {
        page.path().ends_with(&self.product_suffix)
    }
}

impl PageAnalyser for PriceAnalyser {
    fn name(&self) -> &str {
        "price"
    }

    fn analyse(&self, page: &Page, document: &Document) {
        if !self.is_product_page(page) {
            return;
        }

        let prices = extract_prices(document);
        if prices.is_empty() {
            self.sink.report(Finding::NoPriceFound { page: page.clone() });
            return;
        }

        for price in prices {
            self.sink.report(Finding::Price {
                page: page.clone(),
                price,
                verdict: self.range.check(price.amount),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemorySink;
    use crate::price::{Currency, Verdict};

    fn create_test_analyser() -> (PriceAnalyser, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let analyser = PriceAnalyser::new(PriceRange::new(20.0, 2000.0), ".html", sink.clone());
        (analyser, sink)
    }

    fn price_span(amount: &str, currency: &str) -> String {
        format!(
            r#"<span class="rfloat prd-price"><span property="gr:hasCurrencyValue">{amount}</span> <span property="gr:hasCurrency">{currency}</span></span>"#
        )
    }

    #[test]
    fn test_product_page_price() {
        let (analyser, _) = create_test_analyser();
        let page = Page::parse("http://www.example.com/C5172dd2.html").unwrap();
        let document = Document::parse(&price_span("88.00", "SGD"));

        assert!(analyser.is_product_page(&page));
        let prices = extract_prices(&document);
        assert_eq!(prices.len(), 1);
        assert!((prices[0].amount - 88.0).abs() < 0.1);
        assert_eq!(prices[0].currency, Some(Currency::Sgd));
    }

    #[test]
    fn test_price_more_than_a_thousand() {
        let (analyser, _) = create_test_analyser();
        let page = Page::parse("http://www.example.com/C5172dd2.html").unwrap();
        let document = Document::parse(&price_span("2,000,900.00", "SGD"));

        assert!(analyser.is_product_page(&page));
        let prices = extract_prices(&document);
        assert_eq!(prices.len(), 1);
        assert!((prices[0].amount - 2_000_900.0).abs() < 0.1);
    }

    #[test]
    fn test_not_a_product_page() {
        let (analyser, sink) = create_test_analyser();
        let page = Page::parse("http://www.example.com/shoes").unwrap();
        let document = Document::parse(&price_span("88.00", "SGD"));

        assert!(!analyser.is_product_page(&page));

        analyser.analyse(&page, &document);
        assert!(sink.findings().is_empty());
    }

    #[test]
    fn test_unknown_currency() {
        let document = Document::parse(&price_span("88.00", "XYZ"));
        let prices = extract_prices(&document);
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].currency, None);
    }

    #[test]
    fn test_unparsable_amount_skipped() {
        let html = format!(
            "{}{}",
            price_span("call for price", "SGD"),
            price_span("45.00", "SGD")
        );
        let prices = extract_prices(&Document::parse(&html));
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].amount, 45.0);
    }

    #[test]
    fn test_price_element_without_amount_ignored() {
        let document = Document::parse(r#"<span class="prd-price">Sold out</span>"#);
        assert!(extract_prices(&document).is_empty());
    }

    #[test]
    fn test_range_check_reports_each_price() {
        let (analyser, sink) = create_test_analyser();
        let page = Page::parse("http://www.example.com/shoe1.html").unwrap();
        let html = format!(
            "{}{}{}",
            price_span("2,000,900.00", "SGD"),
            price_span("10.00 ", "SGD"),
            price_span("20.00 ", "SGD")
        );

        analyser.analyse(&page, &Document::parse(&html));

        let findings = sink.findings();
        assert_eq!(findings.len(), 3);

        let out_of_range: Vec<String> = sink
            .out_of_range()
            .iter()
            .filter_map(|finding| match finding {
                Finding::Price { price, .. } => Some(price.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(out_of_range, vec!["2000900.00 SGD", "10.00 SGD"]);

        assert!(matches!(
            findings[2],
            Finding::Price {
                verdict: Verdict::InRange,
                ..
            }
        ));
    }

    #[test]
    fn test_product_page_without_price() {
        let (analyser, sink) = create_test_analyser();
        let page = Page::parse("http://www.example.com/shoe1.html").unwrap();

        analyser.analyse(&page, &Document::parse("<html>something</html>"));

        let findings = sink.findings();
        assert_eq!(findings.len(), 1);
        assert!(matches!(&findings[0], Finding::NoPriceFound { page: p } if p == &page));
    }

    #[test]
    fn test_non_numeric_float_amount_not_reported() {
        let (analyser, sink) = create_test_analyser();
        let page = Page::parse("http://www.example.com/x.html").unwrap();
        let html = format!("{}{}", price_span("NaN", "SGD"), price_span("inf", "SGD"));

        analyser.analyse(&page, &Document::parse(&html));

        let findings = sink.findings();
        assert_eq!(findings.len(), 1);
        assert!(matches!(&findings[0], Finding::NoPriceFound { .. }));
    }
}
