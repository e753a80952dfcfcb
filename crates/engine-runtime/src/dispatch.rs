use crate::error::DispatchError;
use async_trait::async_trait;
use model::core::identifiers::{SessionId, StoreId};
use std::{
    collections::VecDeque,
    sync::Mutex,
};

/// One deferred batch invocation handed to the execution facility.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledBatch {
    pub session_id: SessionId,
    pub store: StoreId,
    pub delay_secs: u64,
}

impl ScheduledBatch {
    pub fn immediate(session_id: SessionId, store: StoreId) -> Self {
        ScheduledBatch {
            session_id,
            store,
            delay_secs: 0,
        }
    }
}

/// Deferred-execution boundary. The scheduler enqueues exactly one follow-up
/// invocation per completed page; the host environment decides when it runs.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn schedule_once(&self, batch: ScheduledBatch) -> Result<(), DispatchError>;
}

/// In-process FIFO dispatcher, drained by the [`crate::executor`] loop.
///
/// This is the facility the CLI uses; a hosted deployment would swap in an
/// adapter for its own single-shot task queue.
#[derive(Default)]
pub struct QueueDispatcher {
    queue: Mutex<VecDeque<ScheduledBatch>>,
}

impl QueueDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pop(&self) -> Option<ScheduledBatch> {
        self.queue.lock().unwrap().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl Dispatcher for QueueDispatcher {
    async fn schedule_once(&self, batch: ScheduledBatch) -> Result<(), DispatchError> {
        self.queue.lock().unwrap().push_back(batch);
        Ok(())
    }
}
