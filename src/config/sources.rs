use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "MULTIFETCH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/multifetch.toml";
const ENV_PREFIX: &str = "MULTIFETCH";
const ENV_SEPARATOR: &str = "__";

/// Path of the TOML file to read: `MULTIFETCH_CONFIG` or the default location
pub fn default_path() -> PathBuf {
    env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
///
/// `path` replaces the default file location; `.env` is read either way.
pub fn load(path: Option<PathBuf>) -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    load_from_sources(path.unwrap_or_else(default_path))
}

/// Load configuration from a specific path and environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // MULTIFETCH__BATCH__MAX_CONCURRENCY -> batch.max_concurrency
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.http.request_timeout_secs, 60);
        assert!(config.batch.max_concurrency.is_none());
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[http]
connect_timeout_secs = 3
request_timeout_secs = 20
user_agent = "tester/1.0"
max_payload_bytes = 1048576

[batch]
max_concurrency = 4
deadline_secs = 120

[sink]
output_dir = "downloads"
key_prefix = "img-"
extension = ".jpg"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.http.connect_timeout_secs, 3);
        assert_eq!(config.http.user_agent, "tester/1.0");
        assert_eq!(config.http.max_payload_bytes, Some(1024 * 1024));
        assert_eq!(config.batch.max_concurrency, Some(4));
        assert_eq!(config.batch.deadline_secs, Some(120));
        assert_eq!(config.sink.output_dir, PathBuf::from("downloads"));
        assert_eq!(config.key_naming().key_for(1), "img-2.jpg");
    }

    // Environment overrides are not exercised here: env::set_var is unsafe under edition 2024
}
