//! Tidewalk main entry point
//!
//! This is the command-line interface for the Tidewalk crawler.

use clap::Parser;
use std::path::PathBuf;
use tidewalk::config::{resolve_config, validate, Config, LogFormat, LoggingConfig};
use tidewalk::crawler::crawl;
use tidewalk::validate_seed;
use tracing_subscriber::EnvFilter;

/// Tidewalk: a polite single-domain crawler
///
/// Tidewalk crawls a website breadth-first from a start URL, stays on the
/// start URL's domain, respects robots.txt, and writes every page it
/// fetched to a timestamped file.
#[derive(Parser, Debug)]
#[command(name = "tidewalk")]
#[command(version)]
#[command(about = "A polite single-domain breadth-first crawler", long_about = None)]
struct Cli {
    /// Absolute http(s) URL to start crawling from
    #[arg(value_name = "START_URL")]
    start_url: String,

    /// Maximum crawl depth (the start URL is depth 0)
    #[arg(long)]
    max_depth: Option<u32>,

    /// Number of pages fetched concurrently
    #[arg(long)]
    max_workers: Option<u32>,

    /// Path to TOML configuration file (default: config/$ENVIRONMENT.toml)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Directory the result file is written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Command-line flags win over the configuration file
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(depth) = self.max_depth {
            config.crawler.max_depth = depth;
        }
        if let Some(workers) = self.max_workers {
            config.crawler.max_workers = workers;
        }
        if let Some(dir) = &self.output_dir {
            config.crawler.output_dir = dir.display().to_string();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let resolved = resolve_config(cli.config.as_deref())?;
    let mut config = resolved.config;
    cli.apply_overrides(&mut config);

    // Setup logging based on verbosity and the configured defaults
    setup_logging(cli.verbose, cli.quiet, &config.logging);

    match (&resolved.source, &resolved.hash) {
        (Some(path), Some(hash)) => tracing::info!(
            "Configuration loaded from {} (hash: {})",
            path.display(),
            hash
        ),
        _ => tracing::warn!("No configuration file found, using defaults"),
    }

    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    let seed = match validate_seed(&cli.start_url) {
        Ok(seed) => seed,
        Err(e) => {
            tracing::error!("Invalid start URL: {}", e);
            return Err(e.into());
        }
    };

    match crawl(seed.as_str(), &config).await {
        Ok(report) => {
            tracing::info!(
                pages = report.pages_visited(),
                failed = report.total_failed(),
                blocked = report.total_blocked(),
                levels = report.levels.len(),
                "Crawl completed successfully"
            );
            if let Some(path) = &report.output {
                println!("{}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the tracing subscriber
///
/// `RUST_LOG` takes precedence, then the verbosity flags, then the
/// configured level.
fn setup_logging(verbose: u8, quiet: bool, logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            // Only show errors
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new(&logging.level),
                1 => EnvFilter::new("tidewalk=debug,info"),
                2 => EnvFilter::new("tidewalk=trace,debug"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    // stdout carries only the result path
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
