//! Scripted in-memory transport for unit tests

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::transport::{Result, Transport, TransportError, TransportResponse};

#[derive(Debug, Clone)]
enum Reply {
    Body(Bytes),
    Status(u16, String),
    Error(String),
    Panic,
}

#[derive(Debug, Clone)]
struct Route {
    reply: Reply,
    delay: Duration,
}

/// Transport answering from a fixed table of locators
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    routes: HashMap<String, Route>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn route(mut self, locator: &str, reply: Reply) -> Self {
        self.routes.insert(
            locator.to_string(),
            Route {
                reply,
                delay: Duration::ZERO,
            },
        );
        self
    }

    pub(crate) fn ok(self, locator: &str, body: &'static [u8]) -> Self {
        self.route(locator, Reply::Body(Bytes::from_static(body)))
    }

    pub(crate) fn status(self, locator: &str, status: u16, reason: &str) -> Self {
        self.route(locator, Reply::Status(status, reason.to_string()))
    }

    pub(crate) fn error(self, locator: &str, message: &str) -> Self {
        self.route(locator, Reply::Error(message.to_string()))
    }

    pub(crate) fn panics(self, locator: &str) -> Self {
        self.route(locator, Reply::Panic)
    }

    /// Delay the reply for an already scripted locator
    pub(crate) fn delayed(mut self, locator: &str, delay: Duration) -> Self {
        if let Some(route) = self.routes.get_mut(locator) {
            route.delay = delay;
        }
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn retrieve(&self, locator: &str) -> Result<TransportResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let Some(route) = self.routes.get(locator).cloned() else {
            return Err(TransportError::RequestFailed(format!("no route for {}", locator)));
        };

        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }

        match route.reply {
            Reply::Body(body) => Ok(TransportResponse::ok(body)),
            Reply::Status(status, reason) => Ok(TransportResponse {
                status,
                reason,
                body: Bytes::new(),
            }),
            Reply::Error(message) => Err(TransportError::RequestFailed(message)),
            Reply::Panic => panic!("scripted panic for {}", locator),
        }
    }
}
