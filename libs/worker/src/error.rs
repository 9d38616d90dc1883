use broker_api::PublishError;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("publish: {0:?}")]
    Publish(#[from] PublishError),
}

impl WorkerError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkerError::Publish(e) if e.is_cancelled())
    }
}
