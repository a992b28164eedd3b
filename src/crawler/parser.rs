//! HTML link extraction
//!
//! Turns page content into the set of absolute URLs it links to. Pure: no
//! network or file access.
//!
//! Every `<a href>` value is split on whitespace and each token is resolved
//! against the base URL on its own, since some pages put several URLs in one
//! attribute. Fragments are kept.

use crate::ExtractError;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts every link on the page as an absolute URL
///
/// # Returns
///
/// * `Ok(HashSet<String>)` - Resolved links; duplicates collapse
/// * `Err(ExtractError::EmptyContent)` - `html` is empty
/// * `Err(ExtractError::InvalidBaseUrl)` - `base_url` does not parse as an absolute URL
/// * `Err(ExtractError::LinkResolution)` - The first href token that failed to resolve
///
/// # Example
///
/// ```
/// use tidewalk::crawler::extract_links;
///
/// let html = r#"<a href="/p1">One</a> <a href="p2">Two</a>"#;
/// let links = extract_links(html, "https://example.com").unwrap();
/// assert!(links.contains("https://example.com/p1"));
/// assert!(links.contains("https://example.com/p2"));
/// ```
pub fn extract_links(html: &str, base_url: &str) -> Result<HashSet<String>, ExtractError> {
    resolve_hrefs(html, base_url)?.into_iter().collect()
}

/// Resolves every href token, keeping per-token failures
///
/// The outer error covers invalid input; each inner `Result` is one token,
/// so callers can skip unresolvable links and keep the rest.
pub fn resolve_hrefs(
    html: &str,
    base_url: &str,
) -> Result<Vec<Result<String, ExtractError>>, ExtractError> {
    if html.is_empty() {
        return Err(ExtractError::EmptyContent);
    }

    let base = parse_base(base_url)?;
    let tokens = href_tokens(html);

    Ok(tokens
        .into_iter()
        .map(|token| {
            base.join(&token)
                .map(String::from)
                .map_err(|source| ExtractError::LinkResolution { token, source })
        })
        .collect())
}

fn parse_base(base_url: &str) -> Result<Url, ExtractError> {
    let base = Url::parse(base_url)
        .map_err(|e| ExtractError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;

    if base.scheme().is_empty() || base.cannot_be_a_base() {
        return Err(ExtractError::InvalidBaseUrl(base_url.to_string()));
    }

    Ok(base)
}

/// Whitespace-separated tokens of every anchor href, in document order
fn href_tokens(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut tokens = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                tokens.extend(href.split_whitespace().map(str::to_string));
            }
        }
    }

    tokens
}
