use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use broker_kafka::{KafkaPublisher, ProducerOptions};
use worker::{Worker, WorkerReport, spawn_worker};

use super::config::Effective;
use super::error::AppError;

pub async fn run(eff: Effective) -> Result<(), AppError> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %eff.environment,
        "elastic-log-event starting"
    );

    // --- Broker client: a bad config fails startup here ---
    let publisher = KafkaPublisher::new(&ProducerOptions {
        bootstrap_servers: eff.kafka.bootstrap_servers().to_vec(),
        client_id: eff.kafka.client_id().to_string(),
        message_timeout_ms: eff.kafka.message_timeout_ms(),
        acks: eff.kafka.acks().to_string(),
    })?;

    // --- CancellationToken for graceful shutdown ---
    let token = CancellationToken::new();
    let shutdown_timeout = eff.worker.shutdown_timeout();
    let worker = Worker::new(publisher, eff.kafka, eff.worker);
    let mut handle = spawn_worker(worker, token.clone());

    tokio::select! {
        signal = shutdown_signal() => {
            let signal = signal?;
            tracing::info!(signal, "shutting down...");
        }
        res = &mut handle => {
            // Worker::run returns only after cancellation; getting here means it panicked.
            return Err(AppError::Worker(format!("exited before shutdown: {res:?}")));
        }
    }

    token.cancel();

    match drain(handle, shutdown_timeout).await {
        Some(report) => tracing::info!(
            published = report.published,
            failed = report.failed,
            "shutdown complete"
        ),
        None => tracing::warn!("shutdown complete, worker did not finish cleanly"),
    }
    Ok(())
}

/// Wait up to `timeout` for the worker to stop, abort it otherwise.
pub async fn drain(mut handle: JoinHandle<WorkerReport>, timeout: Duration) -> Option<WorkerReport> {
    match tokio::time::timeout(timeout, &mut handle).await {
        Ok(Ok(report)) => Some(report),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "worker task failed");
            None
        }
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "worker did not stop in time, aborting");
            handle.abort();
            None
        }
    }
}

async fn shutdown_signal() -> Result<&'static str, std::io::Error> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate())?;
        tokio::select! {
            r = tokio::signal::ctrl_c() => r.map(|_| "SIGINT"),
            _ = term.recv() => Ok("SIGTERM"),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|_| "ctrl-c")
    }
}
