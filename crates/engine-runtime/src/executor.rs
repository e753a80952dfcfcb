use crate::{
    dispatch::{Dispatcher, QueueDispatcher, ScheduledBatch},
    error::SchedulerError,
    scheduler::{BatchRun, ImportScheduler},
};
use std::{sync::Arc, time::Duration};
use tracing::info;

/// Drains the in-process dispatch queue until no batch remains.
///
/// This is the local stand-in for a hosted deferred-execution facility: each
/// queued invocation runs in sequence, honoring its scheduled delay, so a
/// whole import can be driven to a terminal state in one process.
pub struct ImportExecutor {
    scheduler: Arc<ImportScheduler>,
    queue: Arc<QueueDispatcher>,
}

impl ImportExecutor {
    pub fn new(scheduler: Arc<ImportScheduler>, queue: Arc<QueueDispatcher>) -> Self {
        ImportExecutor { scheduler, queue }
    }

    /// Run queued batches until the queue is empty, returning the last run's
    /// outcome. `None` means the queue was empty to begin with.
    pub async fn drain(&self) -> Result<Option<BatchRun>, SchedulerError> {
        let mut last = None;
        while let Some(batch) = self.queue.pop() {
            if batch.delay_secs > 0 {
                tokio::time::sleep(Duration::from_secs(batch.delay_secs)).await;
            }
            info!(session = %batch.session_id, "Running scheduled batch");
            last = Some(self.scheduler.run_scheduled(&batch).await?);
        }
        Ok(last)
    }

    pub async fn enqueue(&self, batch: ScheduledBatch) -> Result<(), SchedulerError> {
        self.queue.schedule_once(batch).await?;
        Ok(())
    }
}
