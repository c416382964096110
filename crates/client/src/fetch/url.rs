//! URL canonicalization and the interception scope check.

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize a URL string into the form used for request keys.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let mut parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    if !is_interceptable(&parsed) {
        return Err(UrlError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    if let Some(host) = parsed.host_str().map(str::to_lowercase) {
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether a request for `url` goes through the caching strategies.
///
/// Only http(s) traffic is intercepted; extension and devtools schemes
/// are passed through untouched.
pub fn is_interceptable(url: &url::Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_default_scheme() {
        let url = canonicalize("example.com/app.js").unwrap();
        assert_eq!(url.as_str(), "https://example.com/app.js");
    }

    #[test]
    fn test_canonicalize_lowercase_host() {
        let url = canonicalize("https://EXAMPLE.COM/Static/App.css").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.path(), "/Static/App.css");
    }

    #[test]
    fn test_canonicalize_remove_fragment_keep_query() {
        let url = canonicalize("https://example.com/api/items?b=2&a=1#top").unwrap();
        assert_eq!(url.query(), Some("b=2&a=1"));
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(matches!(canonicalize("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_canonicalize_extension_scheme() {
        let result = canonicalize("chrome-extension://abcdef/popup.html");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(s)) if s == "chrome-extension"));
    }

    #[test]
    fn test_is_interceptable() {
        assert!(is_interceptable(&url::Url::parse("http://example.com/").unwrap()));
        assert!(is_interceptable(&url::Url::parse("https://example.com/").unwrap()));
        assert!(!is_interceptable(&url::Url::parse("devtools://devtools/bundled/inspector.html").unwrap()));
        assert!(!is_interceptable(&url::Url::parse("chrome-extension://abc/script.js").unwrap()));
        assert!(!is_interceptable(&url::Url::parse("ftp://example.com/file").unwrap()));
    }

    #[test]
    fn test_browser_internal_schemes_not_interceptable() {
        for raw in ["about:blank", "data:text/plain,hi", "blob:https://example.com/1234", "moz-extension://id/a.js"] {
            assert!(!is_interceptable(&url::Url::parse(raw).unwrap()), "{raw}");
        }
    }
}
