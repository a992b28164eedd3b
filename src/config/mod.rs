//! Configuration module for Tidewalk
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use tidewalk::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config/dev.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, LogFormat, LoggingConfig, RetryConfig};

// Re-export parser functions
pub use parser::{
    compute_config_hash, default_config_path, load_config, load_config_with_hash, resolve_config,
    ResolvedConfig,
};
pub use validation::validate;
