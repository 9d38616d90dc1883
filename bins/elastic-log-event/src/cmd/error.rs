use broker_api::PublishError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("broker client: {0}")]
    Broker(#[from] PublishError),

    #[error("worker: {0}")]
    Worker(String),

    #[error("signal: {0}")]
    Signal(#[from] std::io::Error),
}
