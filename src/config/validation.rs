use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Timeout must be positive: {field}")]
    ZeroTimeout { field: &'static str },

    #[error("batch.max_concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("batch.deadline_secs must be positive")]
    ZeroDeadline,

    #[error("http.max_payload_bytes must be positive")]
    ZeroPayloadLimit,

    #[error("http.user_agent must not be empty")]
    EmptyUserAgent,

    #[error("sink.extension '{extension}' must be empty or start with '.'")]
    InvalidExtension { extension: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_http(config)?;
    validate_batch(config)?;
    validate_sink(config)?;
    Ok(())
}

fn validate_http(config: &Config) -> Result<(), ValidationError> {
    if config.http.connect_timeout_secs == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "http.connect_timeout_secs",
        });
    }

    if config.http.request_timeout_secs == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "http.request_timeout_secs",
        });
    }

    if config.http.user_agent.trim().is_empty() {
        return Err(ValidationError::EmptyUserAgent);
    }

    if config.http.max_payload_bytes == Some(0) {
        return Err(ValidationError::ZeroPayloadLimit);
    }

    Ok(())
}

fn validate_batch(config: &Config) -> Result<(), ValidationError> {
    if config.batch.max_concurrency == Some(0) {
        return Err(ValidationError::ZeroConcurrency);
    }

    if config.batch.deadline_secs == Some(0) {
        return Err(ValidationError::ZeroDeadline);
    }

    Ok(())
}

fn validate_sink(config: &Config) -> Result<(), ValidationError> {
    let extension = &config.sink.extension;
    if !extension.is_empty() && !extension.starts_with('.') {
        return Err(ValidationError::InvalidExtension {
            extension: extension.clone(),
        });
    }

    Ok(())
}
