use serde::Deserialize;

/// Main configuration structure for Tidewalk
///
/// Every section is optional; missing keys fall back to the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum BFS depth (the seed is depth 0)
    pub max_depth: u32,

    /// Number of fetch+parse tasks allowed to run at once
    pub max_workers: u32,

    /// Value of the HTTP User-Agent header
    pub user_agent: String,

    /// Agent token looked up in robots.txt
    pub robots_agent: String,

    /// Directory the result file is written to
    pub output_dir: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_workers: 5,
            user_agent: format!("tidewalk/{}", env!("CARGO_PKG_VERSION")),
            robots_agent: "*".to_string(),
            output_dir: ".".to_string(),
        }
    }
}

/// HTTP session and retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Number of retries after the first attempt
    pub total: u32,

    /// Geometric backoff factor in seconds
    pub backoff_factor: f64,

    /// Response statuses that trigger a retry
    pub status_forcelist: Vec<u16>,

    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,

    /// Idle connections kept per host
    pub pool_size: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            total: 5,
            backoff_factor: 0.3,
            status_forcelist: vec![500, 502, 503, 504],
            timeout_secs: 5,
            pool_size: 100,
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoggingConfig {
    /// Default filter directive, e.g. "info" or "tidewalk=debug"
    pub level: String,

    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
