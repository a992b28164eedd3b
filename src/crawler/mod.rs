//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - HTML parsing and link extraction
//! - The level-by-level frontier
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod retry;
mod scheduler;

pub use coordinator::{CrawlReport, Crawler, LevelReport};
pub use fetcher::{build_http_client, Fetcher, PageContent};
pub use parser::{extract_links, resolve_hrefs};
pub use retry::{parse_retry_after, Attempt, RetryPolicy, BACKOFF_MAX};
pub use scheduler::{Frontier, FrontierEntry, Generation};

use crate::config::Config;
use crate::CrawlerError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the seed and build the HTTP client
/// 2. Load robots.txt for the seed's domain
/// 3. Crawl breadth-first up to the configured depth
/// 4. Write the visited URLs to the output directory
///
/// # Arguments
///
/// * `seed` - Absolute http(s) URL to start from
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed; `output` holds the result file
/// * `Err(CrawlerError)` - The seed was invalid or the result could not be written
pub async fn crawl(seed: &str, config: &Config) -> Result<CrawlReport, CrawlerError> {
    Crawler::new(seed, config)?.run().await
}
