use std::time::Duration;

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use broker_api::{DeliveryReceipt, Publisher};

use crate::config::{KafkaConfig, WorkerConfig};
use crate::error::WorkerError;
use crate::event::LogEvent;

// ═══════════════════════════════════════════════════════════════
//  State
// ═══════════════════════════════════════════════════════════════

/// Состояние цикла публикации. `Stopped` терминальное.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    RetryBackoff,
    Stopped,
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerState::Running => f.write_str("running"),
            WorkerState::RetryBackoff => f.write_str("retry_backoff"),
            WorkerState::Stopped => f.write_str("stopped"),
        }
    }
}

/// Итог работы цикла, возвращается после остановки.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub published: u64,
    pub failed: u64,
    /// Последний выданный номер события (0, если попыток не было).
    pub last_seq: u64,
}

// ═══════════════════════════════════════════════════════════════
//  Worker: publishing loop
// ═══════════════════════════════════════════════════════════════

/// Periodically builds a `LogEvent`, publishes it to the configured topic
/// and waits for the acknowledgment.
///
/// The worker owns its publisher exclusively. `run` closes it exactly once
/// on the way out and drops it when `run` returns.
///
/// Sequence numbers are taken before every attempt and never reused: an
/// event whose publish failed is dropped and its number stays consumed.
pub struct Worker<P: Publisher> {
    publisher: P,
    kafka: KafkaConfig,
    config: WorkerConfig,
    seq: u64,
    rng: StdRng,
    state_tx: watch::Sender<WorkerState>,
}

impl<P: Publisher> Worker<P> {
    pub fn new(publisher: P, kafka: KafkaConfig, config: WorkerConfig) -> Self {
        let rng = match config.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (state_tx, _) = watch::channel(WorkerState::Running);

        tracing::info!(
            bootstrap_servers = %kafka.bootstrap_servers().join(","),
            client_id = %kafka.client_id(),
            "worker initialized"
        );

        Self {
            publisher,
            kafka,
            config,
            seq: 0,
            rng,
            state_tx,
        }
    }

    /// Подписка на переходы состояния.
    pub fn subscribe_state(&self) -> watch::Receiver<WorkerState> {
        self.state_tx.subscribe()
    }

    /// Run until `token` is cancelled. Per-iteration errors are logged and
    /// never returned.
    pub async fn run(mut self, token: CancellationToken) -> WorkerReport {
        tracing::info!(
            topic = %self.kafka.topic(),
            interval_ms = self.config.interval().as_millis() as u64,
            "worker started"
        );

        let mut report = WorkerReport::default();
        let mut state = WorkerState::Running;

        loop {
            self.set_state(state);
            state = match state {
                WorkerState::Running => self.iterate(&token, &mut report).await,
                WorkerState::RetryBackoff => {
                    if sleep_or_cancel(&token, self.config.retry_backoff()).await {
                        WorkerState::Running
                    } else {
                        WorkerState::Stopped
                    }
                }
                WorkerState::Stopped => break,
            };
        }

        report.last_seq = self.seq;

        if let Err(e) = self.publisher.close().await {
            tracing::warn!(error = ?e, "publisher close error");
        }

        tracing::info!(
            published = report.published,
            failed = report.failed,
            last_seq = report.last_seq,
            "worker stopped"
        );
        report
    }

    /// One RUNNING pass: build, publish, then either wait the interval or
    /// hand over to RETRY_BACKOFF.
    async fn iterate(&mut self, token: &CancellationToken, report: &mut WorkerReport) -> WorkerState {
        if token.is_cancelled() {
            return WorkerState::Stopped;
        }

        self.seq += 1;
        let seq = self.seq;

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => return WorkerState::Stopped,
            r = self.publish_next(seq) => r,
        };

        match outcome {
            Ok(receipt) => {
                report.published += 1;
                tracing::info!(
                    seq,
                    topic = %receipt.topic,
                    partition = receipt.partition,
                    offset = receipt.offset,
                    "published log event"
                );
                if sleep_or_cancel(token, self.config.interval()).await {
                    WorkerState::Running
                } else {
                    WorkerState::Stopped
                }
            }
            // Отмена от брокера без запроса остановки считается обычным сбоем.
            Err(e) if e.is_cancelled() && token.is_cancelled() => WorkerState::Stopped,
            Err(e) => {
                report.failed += 1;
                tracing::error!(seq, error = %e, "error while processing log event");
                WorkerState::RetryBackoff
            }
        }
    }

    async fn publish_next(&mut self, seq: u64) -> Result<DeliveryReceipt, WorkerError> {
        let event = LogEvent::generate(seq, self.config.service(), &mut self.rng, Utc::now());
        let payload = event.to_json()?;
        let receipt = self.publisher.publish(self.kafka.topic(), None, &payload).await?;
        Ok(receipt)
    }

    fn set_state(&self, state: WorkerState) {
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            tracing::debug!(from = %current, to = %state, "worker state");
            *current = state;
            true
        });
    }
}

/// `true` when the full duration elapsed, `false` when cancelled first.
async fn sleep_or_cancel(token: &CancellationToken, dur: Duration) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(dur) => true,
    }
}

/// Запустить worker отдельной задачей.
pub fn spawn_worker<P>(worker: Worker<P>, token: CancellationToken) -> JoinHandle<WorkerReport>
where
    P: Publisher + 'static,
{
    tokio::spawn(worker.run(token))
}
