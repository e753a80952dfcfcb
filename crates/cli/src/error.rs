use engine_core::error::{ProgressError, StateError};
use engine_runtime::error::SchedulerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State store error: {0}")]
    State(#[from] StateError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Progress error: {0}")]
    Progress(#[from] ProgressError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}
