use model::core::identifiers::SessionId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("State store error: {0}")]
    Store(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Failed to load session: {0}")]
    State(#[from] StateError),
}
