use crate::{error::BatchError, post_filter, upsert::EntityUpserter};
use connectors::graphql::client::MAX_PAGE_SIZE;
use engine_core::{
    connectors::RecordSource,
    settings::EngineSettings,
    state::{CursorStore, SessionStore},
};
use model::{
    core::identifiers::{BatchId, SessionId, StoreId},
    pagination::cursor::Cursor,
    records::outcome::{BatchOutcome, UpsertOutcome},
    session::{record::SessionPatch, status::SessionStatus},
};
use std::sync::Arc;
use tracing::{info, warn};

/// Identity of one batch invocation, threaded through logs and the upsert
/// boundary instead of any process-global scratch state.
#[derive(Debug, Clone)]
pub struct BatchContext {
    pub session_id: SessionId,
    pub batch_id: BatchId,
    pub store: StoreId,
}

impl BatchContext {
    pub fn new(session_id: SessionId, store: StoreId) -> Self {
        BatchContext {
            session_id,
            batch_id: BatchId::generate(),
            store,
        }
    }
}

/// Processes exactly one page of records per invocation.
///
/// Each batch is a short-lived unit of work: resolve the resume cursor, fetch
/// one page, post-filter, hand surviving records to the upsert collaborator,
/// then persist the cursor and session totals. Keeping batches to one page
/// bounds the blocking fetch under the host's execution-time ceiling.
pub struct BatchProcessor {
    source: Arc<dyn RecordSource>,
    upserter: Arc<dyn EntityUpserter>,
    sessions: Arc<dyn SessionStore>,
    cursors: Arc<dyn CursorStore>,
    settings: EngineSettings,
}

impl BatchProcessor {
    pub fn new(
        source: Arc<dyn RecordSource>,
        upserter: Arc<dyn EntityUpserter>,
        sessions: Arc<dyn SessionStore>,
        cursors: Arc<dyn CursorStore>,
        settings: EngineSettings,
    ) -> Self {
        BatchProcessor {
            source,
            upserter,
            sessions,
            cursors,
            settings,
        }
    }

    pub async fn run_batch(&self, ctx: &BatchContext) -> Result<BatchOutcome, BatchError> {
        let session = self
            .sessions
            .find(&ctx.session_id)
            .await?
            .ok_or_else(|| BatchError::SessionNotFound(ctx.session_id.clone()))?;

        if session.status.is_terminal() {
            return Err(BatchError::SessionNotActive {
                id: session.id,
                status: session.status,
            });
        }

        if session.status == SessionStatus::Initializing {
            self.sessions
                .update(&session.id, &SessionPatch::status(SessionStatus::InProgress))
                .await?;
        }

        let resource = session.resource;
        let cursor = self
            .cursors
            .get(resource)
            .await?
            .unwrap_or(Cursor::Start);
        let page_size = session
            .options
            .page_size
            .map(|size| size.clamp(1, MAX_PAGE_SIZE))
            .unwrap_or_else(|| self.settings.page_size(resource));

        info!(
            session = %ctx.session_id,
            batch = %ctx.batch_id,
            resource = %resource,
            page_size,
            resuming = !cursor.is_start(),
            "Fetching page"
        );

        // Fetch failure aborts the whole batch with the cursor untouched.
        let page = self
            .source
            .fetch_page(resource, &session.options.filters, page_size, &cursor)
            .await?;

        let page_len = page.records.len() as u64;
        let next_cursor = Cursor::from(page.end_cursor);
        let mut outcome = BatchOutcome::new(page.has_next_page, next_cursor.clone());

        for record in &page.records {
            if let Some(reason) = post_filter::rejection_reason(&session.options.filters, record) {
                outcome.tally(UpsertOutcome::Skipped);
                outcome.log.push(format!(
                    "Skipped {}: {reason}",
                    record.id().unwrap_or("<no id>")
                ));
                continue;
            }

            let report = self
                .upserter
                .upsert(resource, record, &session.options)
                .await;
            outcome.tally(report.outcome);

            if report.outcome == UpsertOutcome::Failed {
                let reason = report.reason.as_deref().unwrap_or("unknown");
                warn!(
                    session = %ctx.session_id,
                    batch = %ctx.batch_id,
                    record = record.id().unwrap_or("<no id>"),
                    reason,
                    "Record upsert failed"
                );
                outcome.log.push(format!(
                    "Failed {}: {reason}",
                    record.id().unwrap_or("<no id>")
                ));
            }
        }

        // Advance the cursor only after the whole page was classified, so a
        // crash mid-page replays the same page instead of losing records.
        if outcome.has_next_page {
            self.cursors.set(resource, &outcome.next_cursor).await?;
        } else {
            self.cursors.clear(resource).await?;
        }

        let patch = SessionPatch {
            items_processed: Some(session.items_processed + page_len),
            items_succeeded: Some(session.items_succeeded + outcome.succeeded()),
            items_failed: Some(session.items_failed + outcome.failed),
            items_skipped: Some(session.items_skipped + outcome.skipped),
            ..Default::default()
        }
        .with_message(format!(
            "Processed {page_len} records ({} imported, {} updated, {} skipped, {} failed)",
            outcome.imported, outcome.updated, outcome.skipped, outcome.failed
        ));
        self.sessions.update(&session.id, &patch).await?;

        info!(
            session = %ctx.session_id,
            batch = %ctx.batch_id,
            imported = outcome.imported,
            updated = outcome.updated,
            skipped = outcome.skipped,
            failed = outcome.failed,
            has_next_page = outcome.has_next_page,
            "Batch complete"
        );

        Ok(outcome)
    }
}
