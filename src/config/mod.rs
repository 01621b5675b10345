//! Configuration management for multifetch
//!
//! Settings are layered from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use multifetch::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Writing to: {}", config.sink.output_dir.display());
//! ```
//!
//! # Environment Variables
//!
//! Any setting can be overridden with `MULTIFETCH__<section>__<key>`:
//! - `MULTIFETCH__BATCH__MAX_CONCURRENCY=8`
//! - `MULTIFETCH__HTTP__REQUEST_TIMEOUT_SECS=30`
//! - `MULTIFETCH__SINK__OUTPUT_DIR=/srv/downloads`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/multifetch.toml`.
//! This can be overridden using the `MULTIFETCH_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{BatchSection, Config, HttpSection, SinkSection};
pub use validation::ValidationError;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::load_unvalidated(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path (plus `.env` and environment overrides)
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = Self::load_unvalidated(Some(path))?;
        config.validate()?;
        Ok(config)
    }

    /// Merge every source without validating.
    ///
    /// For callers that layer their own overrides on top and call
    /// [`validate`](Self::validate) once on the final result.
    pub fn load_unvalidated(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Ok(sources::load(path)?)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate(self)
    }
}
