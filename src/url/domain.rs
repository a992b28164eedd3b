use url::Url;

/// Extracts the crawl domain (network location) from a URL
///
/// The domain is the host plus an explicit port when the URL carries a
/// non-default one. Host case folding is whatever URL parsing already did;
/// no further normalization is applied.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use tidewalk::url::extract_domain;
///
/// let url = Url::parse("https://example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_domain(&url), Some("127.0.0.1:8080".to_string()));
///
/// let url = Url::parse("https://sub.example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("sub.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|h| !h.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Parses `url` and extracts its domain, returning `None` on any failure
pub fn domain_of(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(extract_domain)
}
