//! Tidewalk: a polite single-domain breadth-first crawler
//!
//! This crate discovers every page reachable from a seed URL without leaving
//! the seed's domain, respecting robots.txt and retrying transient failures.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod url;

use thiserror::Error;

/// Main error type for Tidewalk operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("URL has no scheme: {0}")]
    MissingScheme(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

/// Errors raised by the link extractor
///
/// `EmptyContent` and `InvalidBaseUrl` are invalid-input errors and are never
/// retried. `LinkResolution` is scoped to a single href token.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid HTML content provided. Content must be a non-empty string.")]
    EmptyContent,

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Failed to resolve link '{token}': {source}")]
    LinkResolution {
        token: String,
        source: ::url::ParseError,
    },
}

impl ExtractError {
    /// Returns true for the invalid-input category (empty content, bad base URL)
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::EmptyContent | Self::InvalidBaseUrl(_))
    }
}

/// Why a fetch failed after the retry budget was spent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCause {
    /// Final response had a non-success status
    Status(u16),
    /// Every attempt timed out (or the last one did)
    Timeout,
    /// Could not connect
    Connect,
    /// Any other transport failure
    Transport(String),
    /// The body could not be read
    Body(String),
}

impl std::fmt::Display for FetchCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Timeout => write!(f, "request timed out"),
            Self::Connect => write!(f, "connection failed"),
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::Body(e) => write!(f, "failed to read body: {}", e),
        }
    }
}

/// Errors raised by the resilient fetcher
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("URL blocked by robots.txt: {url}")]
    RobotsDisallowed { url: String },

    #[error("Failed to fetch {url}: {cause}")]
    FetchFailed { url: String, cause: FetchCause },
}

impl FetchError {
    /// The URL this error is about
    pub fn url(&self) -> &str {
        match self {
            Self::RobotsDisallowed { url } | Self::FetchFailed { url, .. } => url,
        }
    }
}

/// Result type alias for Tidewalk operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlReport, Crawler};
pub use robots::{PolicyHandle, RobotsPolicy};
pub use crate::url::{validate_seed, AdmissionController};
