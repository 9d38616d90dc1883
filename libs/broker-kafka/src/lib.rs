use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};

use broker_api::{DeliveryReceipt, PublishError, Publisher};

/// Upper bound for the final flush when the publisher is closed.
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings needed to build a producer.
#[derive(Debug, Clone)]
pub struct ProducerOptions {
    pub bootstrap_servers: Vec<String>,
    pub client_id: String,
    /// Local delivery timeout (`message.timeout.ms`). Bounds how long a
    /// single publish waits for the broker before failing.
    pub message_timeout_ms: u64,
    pub acks: String,
}

/// `Publisher` backed by librdkafka's `FutureProducer`.
pub struct KafkaPublisher {
    producer: FutureProducer,
    message_timeout: Duration,
}

impl KafkaPublisher {
    /// Build the producer. Fails with `ErrorKind::Config` when librdkafka
    /// rejects the configuration; broker reachability is not checked here.
    pub fn new(opts: &ProducerOptions) -> Result<Self, PublishError> {
        let servers = opts.bootstrap_servers.join(",");
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &servers)
            .set("client.id", &opts.client_id)
            .set("message.timeout.ms", opts.message_timeout_ms.to_string())
            .set("acks", &opts.acks)
            .create()
            .map_err(|e| PublishError::config(format!("kafka producer ({servers}): {e}")))?;

        tracing::debug!(
            bootstrap_servers = %servers,
            client_id = %opts.client_id,
            message_timeout_ms = opts.message_timeout_ms,
            "kafka producer created"
        );

        Ok(Self {
            producer,
            message_timeout: Duration::from_millis(opts.message_timeout_ms),
        })
    }
}

impl Publisher for KafkaPublisher {
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        key: Option<&'a [u8]>,
        value: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<DeliveryReceipt, PublishError>> + Send + 'a>> {
        Box::pin(async move {
            let mut record = FutureRecord::<[u8], [u8]>::to(topic).payload(value);
            if let Some(key) = key {
                record = record.key(key);
            }
            match self.producer.send(record, self.message_timeout).await {
                Ok((partition, offset)) => Ok(DeliveryReceipt {
                    topic: topic.to_string(),
                    partition,
                    offset,
                }),
                Err((e, _msg)) => Err(classify(e)),
            }
        })
    }

    fn close(&self) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>> {
        Box::pin(async move {
            let producer = self.producer.clone();
            // librdkafka flush blocks the calling thread.
            tokio::task::spawn_blocking(move || producer.flush(CLOSE_FLUSH_TIMEOUT))
                .await
                .map_err(|e| PublishError::transient(format!("flush task: {e}")))?
                .map_err(classify)?;
            tracing::debug!("kafka producer flushed");
            Ok(())
        })
    }
}

/// Map a librdkafka error onto the recovery categories of `ErrorKind`.
pub fn classify(e: KafkaError) -> PublishError {
    match e {
        KafkaError::Canceled => PublishError::cancelled(),
        KafkaError::ClientConfig(..) | KafkaError::ClientCreation(_) => PublishError::config(e.to_string()),
        KafkaError::MessageProduction(
            RDKafkaErrorCode::MessageSizeTooLarge | RDKafkaErrorCode::InvalidMessage,
        ) => PublishError::format_err(e.to_string()),
        other => PublishError::transient(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker_api::ErrorKind;

    fn opts() -> ProducerOptions {
        ProducerOptions {
            bootstrap_servers: vec!["localhost:9092".into()],
            client_id: "test-client".into(),
            message_timeout_ms: 5000,
            acks: "all".into(),
        }
    }

    #[test]
    fn classify_by_recovery_strategy() {
        assert_eq!(classify(KafkaError::Canceled).kind(), ErrorKind::Cancelled);
        assert_eq!(
            classify(KafkaError::ClientCreation("bad".into())).kind(),
            ErrorKind::Config
        );
        assert_eq!(
            classify(KafkaError::MessageProduction(RDKafkaErrorCode::MessageSizeTooLarge)).kind(),
            ErrorKind::Format
        );
        assert_eq!(
            classify(KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut)).kind(),
            ErrorKind::Transient
        );
        assert_eq!(
            classify(KafkaError::MessageProduction(RDKafkaErrorCode::LeaderNotAvailable)).kind(),
            ErrorKind::Transient
        );
    }

    #[test]
    fn producer_builds_without_reachable_broker() {
        let publisher = KafkaPublisher::new(&opts()).expect("producer");
        assert_eq!(publisher.message_timeout, Duration::from_millis(5000));
    }

    #[test]
    fn invalid_setting_is_config_error() {
        let mut o = opts();
        o.acks = "sometimes".into();
        let err = KafkaPublisher::new(&o).err().expect("must fail");
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
