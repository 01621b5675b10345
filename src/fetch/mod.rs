//! Concurrent multi-resource fetching
//!
//! ## Key Components
//!
//! - [`Transport`] - Retrieves the bytes behind one locator ([`HttpTransport`] over reqwest)
//! - [`Fetcher`] - Classifies a single retrieval into a [`FetchOutcome`]
//! - [`BatchFetcher`] - Runs many fetches concurrently and returns a [`BatchResult`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use multifetch::fetch::{BatchFetcher, Fetcher, HttpConfig, HttpTransport, ResourceId};
//!
//! let transport = HttpTransport::new(&HttpConfig::default())?;
//! let batch = BatchFetcher::new(Fetcher::new(Arc::new(transport)));
//!
//! let ids = vec![ResourceId::from("https://example.com/a.jpg")];
//! let result = batch.fetch_all(&ids).await?;
//! if let Some(failure) = &result.failure {
//!     eprintln!("{failure}");
//! }
//! ```

mod batch;
mod fetcher;
mod transport;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{BatchError, BatchFetcher, BatchOptions, CANCELLED};
pub use fetcher::Fetcher;
pub use transport::{
    HttpConfig, HttpTransport, Transport, TransportError, TransportResponse, default_user_agent,
};
pub use types::{AggregateFailure, BatchResult, FetchOutcome, ItemFailure, ResourceId};
