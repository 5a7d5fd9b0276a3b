use crate::UrlError;
use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use price_sweep::url::extract_host;
///
/// let url = Url::parse("https://WWW.Example.com/path").unwrap();
/// assert_eq!(extract_host(&url), Some("www.example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if the URL is HTTP(S) and its host equals `host` exactly
///
/// The comparison is on the whole host, so `other.example.com` never matches
/// `www.example.com` and `example.com.evil.net` never matches `example.com`.
pub fn is_same_host(url: &Url, host: &str) -> bool {
    is_http(url)
        && url
            .host_str()
            .map(|h| h.eq_ignore_ascii_case(host))
            .unwrap_or(false)
}

/// Returns true if the URL passes [`is_same_host`] and names exactly `port`
///
/// Ports are compared as written, so `None` means the scheme's default port.
/// `http://host/` and `https://host/` both match `None`, while
/// `http://host:8080/` only matches `Some(8080)`.
pub fn is_same_authority(url: &Url, host: &str, port: Option<u16>) -> bool {
    is_same_host(url, host) && url.port() == port
}

/// Returns true for `http` and `https` URLs
pub fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Parses a crawl root, accepting only HTTP(S) URLs with a host
pub fn parse_root(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if !is_http(&url) {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_host() {
        let url = Url::parse("https://blog.example.com/post").unwrap();
        assert_eq!(extract_host(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_extract_host_ignores_port() {
        let url = Url::parse("http://127.0.0.1:8080/").unwrap();
        assert_eq!(extract_host(&url), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_same_host_exact() {
        let url = Url::parse("http://www.example.com/shoes").unwrap();
        assert!(is_same_host(&url, "www.example.com"));
        assert!(is_same_host(&url, "WWW.EXAMPLE.COM"));
    }

    #[test]
    fn test_other_subdomain_rejected() {
        let url = Url::parse("http://other.example.com/shoes").unwrap();
        assert!(!is_same_host(&url, "www.example.com"));
    }

    #[test]
    fn test_suffix_trick_rejected() {
        let url = Url::parse("http://www.example.com.evil.net/").unwrap();
        assert!(!is_same_host(&url, "www.example.com"));
    }

    #[test]
    fn test_non_http_rejected() {
        let url = Url::parse("ftp://www.example.com/file").unwrap();
        assert!(!is_same_host(&url, "www.example.com"));
    }

    #[test]
    fn test_same_authority_compares_port() {
        let default_port = Url::parse("http://www.example.com/shoes").unwrap();
        let secure = Url::parse("https://www.example.com/shoes").unwrap();
        let other_port = Url::parse("http://www.example.com:8080/shoes").unwrap();

        assert!(is_same_authority(&default_port, "www.example.com", None));
        assert!(is_same_authority(&secure, "www.example.com", None));
        assert!(!is_same_authority(&other_port, "www.example.com", None));
        assert!(is_same_authority(&other_port, "www.example.com", Some(8080)));
        assert!(!is_same_authority(&default_port, "www.example.com", Some(8080)));
    }

    #[test]
    fn test_parse_root() {
        assert!(parse_root("http://www.example.com").is_ok());
        assert!(matches!(
            parse_root("ftp://www.example.com"),
            Err(UrlError::InvalidScheme(_))
        ));
        assert!(matches!(parse_root("not a url"), Err(UrlError::Parse(_))));
        assert!(parse_root("mailto:someone@example.com").is_err());
    }
}
