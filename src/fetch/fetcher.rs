//! Single-resource fetcher

use std::sync::Arc;
use tracing::{debug, warn};

use super::transport::Transport;
use super::types::{FetchOutcome, ResourceId};

/// Turns one transport retrieval into a [`FetchOutcome`].
///
/// Never fails: transport errors and non-success statuses become
/// `FetchOutcome::Failure` carrying the transport's own wording.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    max_payload_bytes: Option<u64>,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            max_payload_bytes: None,
        }
    }

    /// Reject successful payloads larger than `limit` bytes
    pub fn with_max_payload_bytes(mut self, limit: Option<u64>) -> Self {
        self.max_payload_bytes = limit;
        self
    }

    pub async fn fetch(&self, id: &ResourceId) -> FetchOutcome {
        let url = id.as_str();

        let response = match self.transport.retrieve(url).await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, error = %e, "Retrieval failed");
                return FetchOutcome::Failure(e.to_string());
            }
        };

        if !response.is_success() {
            let status = response.status_line();
            warn!(url, %status, "Non-success status");
            return FetchOutcome::Failure(status);
        }

        if let Some(limit) = self.max_payload_bytes {
            let size = response.body.len() as u64;
            if size > limit {
                warn!(url, size, limit, "Payload over limit");
                return FetchOutcome::Failure(format!(
                    "payload of {} bytes exceeds limit of {} bytes",
                    size, limit
                ));
            }
        }

        debug!(url, size = response.body.len(), "Fetched");
        FetchOutcome::Payload(response.body)
    }
}
