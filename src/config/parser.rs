use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Environment variable selecting `config/<name>.toml`
const ENVIRONMENT_VAR: &str = "ENVIRONMENT";

/// Environment used when `ENVIRONMENT` is unset
const DEFAULT_ENVIRONMENT: &str = "dev";

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so two runs can be told apart by their settings.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Returns `config/<environment>.toml`, defaulting the environment to `dev`
pub fn default_config_path(environment: Option<&str>) -> PathBuf {
    let environment = environment
        .filter(|e| !e.trim().is_empty())
        .unwrap_or(DEFAULT_ENVIRONMENT);
    PathBuf::from("config").join(format!("{}.toml", environment))
}

/// A configuration together with where it came from
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: Config,
    /// File the configuration was read from; `None` means built-in defaults
    pub source: Option<PathBuf>,
    /// SHA-256 of the file content, when a file was read
    pub hash: Option<String>,
}

/// Resolves the configuration for a run
///
/// An explicit path must exist. Without one, `config/$ENVIRONMENT.toml` is
/// used when present, and the built-in defaults otherwise.
pub fn resolve_config(explicit: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
    if let Some(path) = explicit {
        let (config, hash) = load_config_with_hash(path)?;
        return Ok(ResolvedConfig {
            config,
            source: Some(path.to_path_buf()),
            hash: Some(hash),
        });
    }

    let environment = std::env::var(ENVIRONMENT_VAR).ok();
    let path = default_config_path(environment.as_deref());
    if path.is_file() {
        let (config, hash) = load_config_with_hash(&path)?;
        Ok(ResolvedConfig {
            config,
            source: Some(path),
            hash: Some(hash),
        })
    } else {
        Ok(ResolvedConfig {
            config: Config::default(),
            source: None,
            hash: None,
        })
    }
}
