//! Page identity and parsed documents
//!
//! A [`Page`] is one crawl unit. Its identity is its canonical URL string, so
//! two pages that differ only by fragment, query or trailing slash are equal
//! and hash the same. A [`Document`] is the parsed HTML of one fetched page.

use crate::crawler::{FetchError, Fetcher};
use crate::url::{canonicalize_url, parse_root};
use crate::UrlError;
use scraper::html::Select;
use scraper::{Html, Selector};
use std::fmt;
use std::hash::{Hash, Hasher};
use url::Url;

/// One crawl unit, identified by its canonical URL
#[derive(Debug, Clone)]
pub struct Page {
    /// The URL that will be fetched (rebuilt from the canonical form)
    url: Url,

    /// The canonical identity string
    canonical: String,
}

impl Page {
    /// Creates a page from a parsed URL
    ///
    /// The stored URL is rebuilt from the canonical form so that every page
    /// with the same identity is fetched through the same address.
    pub fn new(url: Url) -> Self {
        let canonical = canonicalize_url(&url);
        let url = Url::parse(&canonical).unwrap_or(url);
        Self { url, canonical }
    }

    /// Parses a URL string into a page
    ///
    /// # Returns
    ///
    /// * `Ok(Page)` - The string is an HTTP(S) URL with a host
    /// * `Err(UrlError)` - The string is malformed or not HTTP(S)
    ///
    /// # Example
    ///
    /// ```
    /// use price_sweep::Page;
    ///
    /// let a = Page::parse("http://www.example.com/shoes/").unwrap();
    /// let b = Page::parse("http://www.example.com/shoes#reviews").unwrap();
    /// assert_eq!(a, b);
    /// assert_eq!(a.canonical(), "http://www.example.com/shoes");
    /// ```
    pub fn parse(url_str: &str) -> Result<Self, UrlError> {
        parse_root(url_str).map(Self::new)
    }

    /// The URL to fetch for this page
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The canonical identity string
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// The URL path, used by analysers to recognise page kinds
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Fetches the page once and parses the body
    pub async fn fetch_document<F: Fetcher>(&self, fetcher: &F) -> Result<Document, FetchError> {
        let body = fetcher.fetch(self).await?;
        Ok(Document::parse(&body))
    }
}

impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Page {}

impl Hash for Page {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// Parsed HTML for one fetched page
///
/// Documents are built and dropped inside a single worker cycle. The
/// underlying tree is not `Send`, so a document must never be held across
/// an `.await`.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses raw page content into a document
    ///
    /// HTML parsing is error tolerant: malformed markup still yields a tree.
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    /// Iterates over the elements matching a selector
    pub fn select<'a, 'b>(&'a self, selector: &'b Selector) -> Select<'a, 'b> {
        self.html.select(selector)
    }

    /// The document's `<title>`, if any
    fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.select(&selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("title", &self.title())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::testing::SiteFetcher;
    use std::collections::HashSet;

    #[test]
    fn test_page_identity_ignores_fragment_query_and_slash() {
        let pages = [
            Page::parse("http://www.example.com/item.html").unwrap(),
            Page::parse("http://www.example.com/item.html#info").unwrap(),
            Page::parse("http://www.example.com/item.html?sort=asc").unwrap(),
            Page::parse("http://www.example.com/item.html/").unwrap(),
        ];

        let unique: HashSet<_> = pages.iter().cloned().collect();
        assert_eq!(unique.len(), 1);
    }

    #[test]
    fn test_page_url_is_canonical() {
        let page = Page::parse("http://www.example.com/shoes/?sort=asc#top").unwrap();
        assert_eq!(page.url().as_str(), "http://www.example.com/shoes");
        assert_eq!(page.path(), "/shoes");
    }

    #[test]
    fn test_root_page() {
        let page = Page::parse("http://www.example.com").unwrap();
        assert_eq!(page.canonical(), "http://www.example.com");
        assert_eq!(page.url().as_str(), "http://www.example.com/");
    }

    #[test]
    fn test_distinct_pages() {
        let a = Page::parse("http://www.example.com").unwrap();
        let b = Page::parse("http://www.example.com/shoes/").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_page() {
        assert!(Page::parse("not a url").is_err());
        assert!(Page::parse("javascript:void(0)").is_err());
    }

    #[test]
    fn test_document_title() {
        let doc = Document::parse("<html><head><title>  Shoes  </title></head></html>");
        assert_eq!(doc.title(), Some("Shoes".to_string()));

        let doc = Document::parse("<html><head></head><body></body></html>");
        assert_eq!(doc.title(), None);
    }

    #[tokio::test]
    async fn test_fetch_document() {
        let site = SiteFetcher::new().with_page(
            "http://www.example.com/boot.html",
            "<html><head><title>Boot</title></head></html>",
        );

        let page = Page::parse("http://www.example.com/boot.html#reviews").unwrap();
        let document = page.fetch_document(&site).await.unwrap();
        assert_eq!(document.title(), Some("Boot".to_string()));

        let missing = Page::parse("http://www.example.com/gone.html").unwrap();
        assert!(matches!(
            missing.fetch_document(&site).await,
            Err(FetchError::NotFound(404))
        ));
    }

    #[test]
    fn test_document_select() {
        let doc = Document::parse(r#"<a href="/a">A</a><a href="/b">B</a>"#);
        let selector = Selector::parse("a[href]").unwrap();
        assert_eq!(doc.select(&selector).count(), 2);
    }
}
