use connectors::error::FetchError;
use engine_core::error::StateError;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Dispatch failed: {0}")]
pub struct DispatchError(pub String);

/// Failures of the scheduler itself, as opposed to batch outcomes.
///
/// A failing fetch inside a batch is not an error here; the scheduler absorbs
/// it into a session state transition. These variants cover the scheduler's
/// own infrastructure: state storage, the initial count probe, and handoff to
/// the deferred-execution facility.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error("Count probe failed: {0}")]
    Count(#[from] FetchError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
