//! Batch orchestrator
//!
//! Fans one retrieval per identifier out to tokio tasks and fans the outcomes
//! back in by index. Every launched retrieval is awaited; a failure in one slot
//! never stops the others. Two scheduling modes share the same contract:
//!
//! - unbounded: one task per identifier (`JoinSet`)
//! - bounded: a fixed pool of workers pulling `(index, id)` pairs from a shared queue
//!
//! Either way the returned [`BatchResult`] has one outcome per input, in input order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use super::fetcher::Fetcher;
use super::types::{BatchResult, FetchOutcome, ResourceId};
use crate::observability::Metrics;

/// Description recorded for retrievals abandoned by cancellation or deadline
pub const CANCELLED: &str = "cancelled";

const NOT_REPORTED: &str = "task did not report an outcome";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("identifier at index {index} is blank")]
    BlankIdentifier { index: usize },

    #[error("max_concurrency must be at least 1")]
    ZeroConcurrency,
}

/// Scheduling knobs for a batch
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// `None` launches every retrieval at once
    pub max_concurrency: Option<usize>,
    /// Abandon outstanding retrievals after this long
    pub deadline: Option<Duration>,
}

/// Fetches many resources concurrently through one [`Fetcher`]
#[derive(Clone)]
pub struct BatchFetcher {
    fetcher: Fetcher,
    options: BatchOptions,
    metrics: Option<Arc<Metrics>>,
}

impl BatchFetcher {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            options: BatchOptions::default(),
            metrics: None,
        }
    }

    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Fetch every identifier and return index-aligned outcomes
    pub async fn fetch_all(&self, ids: &[ResourceId]) -> Result<BatchResult, BatchError> {
        self.fetch_all_with_cancel(ids, CancellationToken::new()).await
    }

    /// Like [`fetch_all`](Self::fetch_all), but outstanding retrievals are
    /// abandoned once `cancel` fires. Abandoned slots hold `Failure("cancelled")`.
    pub async fn fetch_all_with_cancel(
        &self,
        ids: &[ResourceId],
        cancel: CancellationToken,
    ) -> Result<BatchResult, BatchError> {
        self.validate(ids)?;

        if ids.is_empty() {
            return Ok(BatchResult::empty());
        }

        let batch_id = Uuid::now_v7();
        let span = info_span!("batch", %batch_id, size = ids.len());

        async move {
            let token = cancel.child_token();
            let deadline = self.options.deadline.map(|after| {
                let token = token.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    warn!(deadline_ms = after.as_millis() as u64, "Batch deadline reached");
                    token.cancel();
                })
            });

            let outcomes = match self.options.max_concurrency {
                None => self.fan_out(ids, &token).await,
                Some(limit) => self.worker_pool(ids, limit, &token).await,
            };

            if let Some(timer) = deadline {
                timer.abort();
            }

            let result = BatchResult::from_outcomes(ids, outcomes);
            self.record(&result);

            info!(
                succeeded = result.succeeded(),
                failed = result.failed(),
                "Batch completed"
            );

            Ok(result)
        }
        .instrument(span)
        .await
    }

    fn validate(&self, ids: &[ResourceId]) -> Result<(), BatchError> {
        if self.options.max_concurrency == Some(0) {
            return Err(BatchError::ZeroConcurrency);
        }

        if let Some(index) = ids.iter().position(|id| id.as_str().trim().is_empty()) {
            return Err(BatchError::BlankIdentifier { index });
        }

        Ok(())
    }

    /// One task per identifier
    async fn fan_out(&self, ids: &[ResourceId], cancel: &CancellationToken) -> Vec<FetchOutcome> {
        let mut slots: Vec<Option<FetchOutcome>> = vec![None; ids.len()];
        let mut tasks = JoinSet::new();
        let mut task_slots = HashMap::with_capacity(ids.len());

        for (index, id) in ids.iter().cloned().enumerate() {
            let fetcher = self.fetcher.clone();
            let cancel = cancel.clone();
            debug!(index, url = %id, "Launching retrieval");

            let handle = tasks.spawn(async move {
                let outcome = fetch_or_cancel(&fetcher, &id, &cancel).await;
                (index, outcome)
            });
            task_slots.insert(handle.id(), index);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, (index, outcome))) => slots[index] = Some(outcome),
                Err(e) => {
                    if let Some(&index) = task_slots.get(&e.id()) {
                        warn!(index, error = %e, "Retrieval task failed");
                        let description = format!("task panicked: {}", e);
                        slots[index] = Some(FetchOutcome::Failure(description));
                    }
                }
            }
        }

        fill_slots(slots)
    }

    /// `limit` workers draining a shared queue of `(index, id)` pairs
    async fn worker_pool(
        &self,
        ids: &[ResourceId],
        limit: usize,
        cancel: &CancellationToken,
    ) -> Vec<FetchOutcome> {
        let workers = limit.min(ids.len());
        let (job_tx, job_rx) = mpsc::channel::<(usize, ResourceId)>(ids.len());
        let (result_tx, mut result_rx) = mpsc::channel::<(usize, FetchOutcome)>(ids.len());

        for (index, id) in ids.iter().cloned().enumerate() {
            // Sized to the batch, so this never waits
            if job_tx.send((index, id)).await.is_err() {
                break;
            }
        }
        drop(job_tx);

        let job_rx = Arc::new(Mutex::new(job_rx));
        let mut tasks = JoinSet::new();

        debug!(workers, "Starting worker pool");

        for worker_id in 0..workers {
            let fetcher = self.fetcher.clone();
            let cancel = cancel.clone();
            let job_rx = Arc::clone(&job_rx);
            let result_tx = result_tx.clone();

            tasks.spawn(async move {
                loop {
                    let next = job_rx.lock().await.recv().await;
                    let Some((index, id)) = next else {
                        break;
                    };

                    debug!(worker_id, index, url = %id, "Worker picked up retrieval");
                    let outcome = fetch_isolated(&fetcher, index, id, &cancel).await;

                    if result_tx.send((index, outcome)).await.is_err() {
                        break;
                    }
                }
                debug!(worker_id, "Worker drained");
            });
        }
        drop(result_tx);

        let mut slots: Vec<Option<FetchOutcome>> = vec![None; ids.len()];
        while let Some((index, outcome)) = result_rx.recv().await {
            slots[index] = Some(outcome);
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Worker task failed");
            }
        }

        fill_slots(slots)
    }

    fn record(&self, result: &BatchResult) {
        let Some(metrics) = &self.metrics else {
            return;
        };

        for outcome in &result.outcomes {
            match outcome {
                FetchOutcome::Payload(bytes) => metrics.resource_fetched(bytes.len()),
                FetchOutcome::Failure(_) => metrics.resource_failed(),
            }
        }
        metrics.batch_completed();
    }
}

async fn fetch_or_cancel(
    fetcher: &Fetcher,
    id: &ResourceId,
    cancel: &CancellationToken,
) -> FetchOutcome {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!(url = %id, "Retrieval abandoned");
            FetchOutcome::Failure(CANCELLED.to_string())
        }
        outcome = fetcher.fetch(id) => outcome,
    }
}

/// Runs one retrieval on its own task so a panic costs only that slot and the
/// worker keeps draining the queue.
async fn fetch_isolated(
    fetcher: &Fetcher,
    index: usize,
    id: ResourceId,
    cancel: &CancellationToken,
) -> FetchOutcome {
    let fetcher = fetcher.clone();
    let cancel = cancel.clone();
    let url = id.clone();

    match tokio::spawn(async move { fetch_or_cancel(&fetcher, &id, &cancel).await }).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(index, url = %url, error = %e, "Retrieval task failed");
            FetchOutcome::Failure(format!("task panicked: {}", e))
        }
    }
}

/// Slots left empty by a lost task still get an outcome
fn fill_slots(slots: Vec<Option<FetchOutcome>>) -> Vec<FetchOutcome> {
    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| FetchOutcome::Failure(NOT_REPORTED.to_string())))
        .collect()
}
