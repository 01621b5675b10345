use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use multifetch::config::Config;
use multifetch::fetch::{
    AggregateFailure, BatchFetcher, BatchResult, Fetcher, HttpTransport, ItemFailure, ResourceId,
};
use multifetch::observability::Metrics;
use multifetch::sink::PayloadSink;

use crate::cli::FetchArgs;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Fetch(#[from] AggregateFailure),

    #[error("{0} payload(s) could not be stored")]
    Sink(usize),
}

pub async fn run(args: FetchArgs) -> Result<(), AnyError> {
    let config = load_config(&args)?;

    let transport = HttpTransport::new(&config.http_config())?;
    let fetcher =
        Fetcher::new(Arc::new(transport)).with_max_payload_bytes(config.http.max_payload_bytes);
    let metrics = Arc::new(Metrics::new());
    let batch = BatchFetcher::new(fetcher)
        .with_options(config.batch_options())
        .with_metrics(Arc::clone(&metrics));

    // Sink first, so a bad output directory fails before any network traffic
    let sink = PayloadSink::local(&config.sink.output_dir, config.key_naming())?;

    let ids: Vec<ResourceId> = args
        .urls
        .iter()
        .map(|url| ResourceId::from(url.as_str()))
        .collect();

    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn(cancel_on_signal(cancel.clone()));

    info!(count = ids.len(), "Fetching resources");
    let result = batch.fetch_all_with_cancel(&ids, cancel).await?;
    interrupt.abort();

    let written = sink.persist_batch(&result).await;
    let sink_failures = written.iter().filter(|(_, r)| r.is_err()).count();

    let snapshot = metrics.snapshot();
    info!(
        fetched = snapshot.resources_fetched,
        failed = snapshot.resources_failed,
        bytes = snapshot.bytes_fetched,
        stored = written.len() - sink_failures,
        output_dir = %config.sink.output_dir.display(),
        "Run finished"
    );

    if let Some(path) = &args.report {
        write_report(path, &result)?;
    }

    if let Some(failure) = result.failure {
        for item in &failure.failures {
            error!(index = item.index, url = %item.id, error = %item.description, "Resource failed");
        }
        return Err(RunError::Fetch(failure).into());
    }

    if sink_failures > 0 {
        return Err(RunError::Sink(sink_failures).into());
    }

    println!("All files downloaded successfully!");
    Ok(())
}

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    total: usize,
    succeeded: usize,
    failures: &'a [ItemFailure],
}

fn write_report(path: &Path, result: &BatchResult) -> Result<(), AnyError> {
    let report = RunReport {
        total: result.len(),
        succeeded: result.succeeded(),
        failures: result
            .failure
            .as_ref()
            .map(|f| f.failures.as_slice())
            .unwrap_or_default(),
    };

    std::fs::write(path, serde_json::to_vec_pretty(&report)?)?;
    info!(path = %path.display(), "Report written");
    Ok(())
}

/// File, `.env` and environment first, then flags, then one validation pass
fn load_config(args: &FetchArgs) -> Result<Config, AnyError> {
    let mut config = Config::load_unvalidated(args.config.clone())?;
    apply_overrides(&mut config, args);
    config.validate()?;
    Ok(config)
}

/// Command-line flags win over file and environment settings
fn apply_overrides(config: &mut Config, args: &FetchArgs) {
    if let Some(dir) = &args.output_dir {
        config.sink.output_dir = dir.clone();
    }
    if let Some(limit) = args.concurrency {
        config.batch.max_concurrency = Some(limit);
    }
    if let Some(secs) = args.deadline_secs {
        config.batch.deadline_secs = Some(secs);
    }
    if let Some(extension) = &args.extension {
        config.sink.extension = extension.clone();
    }
}

/// Cancel the batch on Ctrl+C or SIGTERM
async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Interrupted, abandoning outstanding retrievals");
    cancel.cancel();
}
