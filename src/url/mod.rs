//! URL handling module for Tidewalk
//!
//! This module provides seed validation, domain extraction, and the
//! admission controller that decides which URLs the crawl may claim.

mod admission;
mod domain;

use crate::{UrlError, UrlResult};
use url::Url;

pub use admission::AdmissionController;
pub use domain::{domain_of, extract_domain};

/// Validates a seed URL before the crawl starts
///
/// A seed must parse as an absolute URL with an http(s) scheme and a
/// non-empty host.
///
/// # Examples
///
/// ```
/// use tidewalk::url::validate_seed;
///
/// assert!(validate_seed("https://example.com").is_ok());
/// assert!(validate_seed("example.com").is_err());
/// ```
pub fn validate_seed(seed: &str) -> UrlResult<Url> {
    let url = Url::parse(seed).map_err(|e| match e {
        url::ParseError::RelativeUrlWithoutBase => UrlError::MissingScheme(seed.to_string()),
        url::ParseError::EmptyHost => UrlError::MissingHost(seed.to_string()),
        other => UrlError::Parse(format!("{}: {}", seed, other)),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::UnsupportedScheme(url.scheme().to_string()));
    }

    if extract_domain(&url).is_none() {
        return Err(UrlError::MissingHost(seed.to_string()));
    }

    Ok(url)
}

/// Returns true if `url` is a well-formed absolute URL with scheme and host
pub fn is_valid_url(url: &str) -> bool {
    validate_seed(url).is_ok()
}
