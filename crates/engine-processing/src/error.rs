use connectors::error::FetchError;
use engine_core::error::StateError;
use model::{core::identifiers::SessionId, session::status::SessionStatus};
use thiserror::Error;

/// Batch-level fatal conditions.
///
/// Everything here aborts the whole batch and is surfaced to the scheduler,
/// which turns it into a session state transition. Per-record upsert failures
/// are not errors; they are tallied inside the batch outcome.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("Session {0} not found")]
    SessionNotFound(SessionId),

    #[error("Session {id} is {status}, refusing to run a batch")]
    SessionNotActive { id: SessionId, status: SessionStatus },
}

impl BatchError {
    /// True when the condition is a credential problem. The scheduler never
    /// retries these automatically.
    pub fn is_auth(&self) -> bool {
        matches!(self, BatchError::Fetch(e) if e.is_auth())
    }
}
