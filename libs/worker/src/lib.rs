pub mod config;
pub mod error;
pub mod event;
mod worker;

pub use config::{KafkaConfig, KafkaSettings, WorkerConfig, WorkerSettings};
pub use error::WorkerError;
pub use event::LogEvent;
pub use worker::{Worker, WorkerReport, WorkerState, spawn_worker};
