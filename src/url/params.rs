use std::collections::HashSet;
use url::Url;

/// Returns the distinct query parameter keys of a URL
///
/// A key without a value (`?gender=`) or without an `=` at all (`?flag`)
/// still counts. Keys are percent-decoded.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use price_sweep::url::query_keys;
///
/// let url = Url::parse("http://www.example.com/shoes?gender=male&sort=popularity").unwrap();
/// let keys = query_keys(&url);
/// assert_eq!(keys.len(), 2);
/// assert!(keys.contains("gender"));
/// ```
pub fn query_keys(url: &Url) -> HashSet<String> {
    url.query_pairs()
        .map(|(key, _)| key.into_owned())
        .filter(|key| !key.is_empty())
        .collect()
}

/// Returns true if the URL has a query and every key belongs to `allowed`
pub fn has_only_keys_from(url: &Url, allowed: &HashSet<String>) -> bool {
    let keys = query_keys(url);
    !keys.is_empty() && keys.iter().all(|key| allowed.contains(key))
}
