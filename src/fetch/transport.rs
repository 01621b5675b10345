//! Transport collaborator: one blocking retrieval per locator

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Proxy};
use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    RequestFailed(String),

    #[error("connection timeout")]
    Timeout,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("failed to read body: {0}")]
    BodyRead(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Raw response handed back by a transport
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub reason: String,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            reason: "OK".to_string(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Status line the way HTTP clients print it, e.g. `404 Not Found`
    pub fn status_line(&self) -> String {
        if self.reason.is_empty() {
            self.status.to_string()
        } else {
            format!("{} {}", self.status, self.reason)
        }
    }
}

/// Retrieves the bytes behind a locator.
///
/// Implementations report transport problems as `Err` and leave status
/// interpretation to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn retrieve(&self, locator: &str) -> Result<TransportResponse>;
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub proxy_url: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            user_agent: default_user_agent(),
            proxy_url: None,
        }
    }
}

pub fn default_user_agent() -> String {
    format!("multifetch/{}", env!("CARGO_PKG_VERSION"))
}

/// reqwest-backed transport issuing a single GET per retrieval
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(url) = &config.proxy_url {
            let proxy = Proxy::all(url)
                .map_err(|e| TransportError::InvalidUrl(format!("invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        Ok(Self { client })
    }

    fn classify(e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_redirect() {
            TransportError::TooManyRedirects
        } else if e.is_builder() {
            TransportError::InvalidUrl(error_chain(&e))
        } else {
            TransportError::RequestFailed(error_chain(&e))
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn retrieve(&self, locator: &str) -> Result<TransportResponse> {
        debug!(url = locator, "Sending request");

        let response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(Self::classify)?;

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("").to_string();

        // Error bodies are not part of the outcome
        if !status.is_success() {
            debug!(url = locator, status = status.as_u16(), "Non-success status");
            return Ok(TransportResponse {
                status: status.as_u16(),
                reason,
                body: Bytes::new(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::BodyRead(error_chain(&e))
            }
        })?;

        debug!(url = locator, status = status.as_u16(), size = body.len(), "Response received");

        Ok(TransportResponse {
            status: status.as_u16(),
            reason,
            body,
        })
    }
}

/// Display text of `e` followed by every `source()` below it, joined with `: `.
///
/// reqwest keeps the OS-level cause (e.g. `Connection refused`) out of its own
/// message, so the chain is the only place it shows up.
fn error_chain(e: &dyn StdError) -> String {
    let mut text = e.to_string();
    let mut source = e.source();

    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !cause_text.is_empty() && !text.ends_with(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }

    text
}
