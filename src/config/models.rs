use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::{BatchOptions, HttpConfig, default_user_agent};
use crate::sink::KeyNaming;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpSection,
    #[serde(default)]
    pub batch: BatchSection,
    #[serde(default)]
    pub sink: SinkSection,
}

/// Transport settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpSection {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    pub proxy_url: Option<String>,
    /// Successful responses larger than this are recorded as failures
    pub max_payload_bytes: Option<u64>,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            proxy_url: None,
            max_payload_bytes: None,
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// Batch scheduling
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BatchSection {
    /// Worker pool size; unset means one task per resource
    pub max_concurrency: Option<usize>,
    pub deadline_secs: Option<u64>,
}

/// Where fetched payloads are written
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SinkSection {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub key_prefix: String,
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for SinkSection {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            key_prefix: String::new(),
            extension: default_extension(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_extension() -> String {
    ".bin".to_string()
}

impl Config {
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            connect_timeout: Duration::from_secs(self.http.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.http.request_timeout_secs),
            user_agent: self.http.user_agent.clone(),
            proxy_url: self.http.proxy_url.clone(),
        }
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            max_concurrency: self.batch.max_concurrency,
            deadline: self.batch.deadline_secs.map(Duration::from_secs),
        }
    }

    pub fn key_naming(&self) -> KeyNaming {
        KeyNaming {
            prefix: self.sink.key_prefix.clone(),
            extension: self.sink.extension.clone(),
        }
    }
}
