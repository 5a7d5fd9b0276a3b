use url::Url;

/// Reduces a URL string to its canonical crawl identity
///
/// # Canonicalization Steps
///
/// 1. Remove the fragment (everything from the first `#`)
/// 2. Remove the query string (everything from the first `?`)
/// 3. Remove trailing slashes
///
/// Each step only touches text that the previous steps left at the end of the
/// string, so applying the function twice gives the same result as applying
/// it once.
///
/// # Arguments
///
/// * `url` - The URL string to canonicalize
///
/// # Returns
///
/// The canonical string used for page equality and frontier dedup
///
/// # Examples
///
/// ```
/// use price_sweep::url::canonicalize;
///
/// assert_eq!(canonicalize("http://www.example.com/"), "http://www.example.com");
/// assert_eq!(
///     canonicalize("http://www.example.com/item.html#info"),
///     "http://www.example.com/item.html"
/// );
/// assert_eq!(
///     canonicalize("http://www.example.com/item.html?sort=asc"),
///     "http://www.example.com/item.html"
/// );
/// ```
pub fn canonicalize(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or_default();
    let without_query = without_fragment.split('?').next().unwrap_or_default();
    without_query.trim_end_matches('/').to_string()
}

/// Canonicalizes an already parsed URL
///
/// The `url` crate always serializes an empty path as `/`, which the
/// trailing-slash rule removes again, so `http://host` and `http://host/`
/// share one identity.
pub fn canonicalize_url(url: &Url) -> String {
    canonicalize(url.as_str())
}
