use crate::{error::ProgressError, state::SessionStore};
use model::{
    core::identifiers::SessionId,
    session::status::SessionStatus,
};
use serde::Serialize;
use std::sync::Arc;

/// Snapshot of an import session for status polling.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub items_total: u64,
    pub total_estimated: bool,
    pub items_processed: u64,
    pub items_succeeded: u64,
    pub items_failed: u64,
    pub items_skipped: u64,
    pub percentage: u8,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub struct ProgressService {
    sessions: Arc<dyn SessionStore>,
}

impl ProgressService {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }

    pub async fn get_progress(&self, id: &SessionId) -> Result<ProgressReport, ProgressError> {
        let session = self
            .sessions
            .find(id)
            .await?
            .ok_or_else(|| ProgressError::SessionNotFound(id.clone()))?;

        Ok(ProgressReport {
            session_id: session.id.clone(),
            status: session.status,
            items_total: session.items_total,
            total_estimated: session.total_estimated,
            items_processed: session.items_processed,
            items_succeeded: session.items_succeeded,
            items_failed: session.items_failed,
            items_skipped: session.items_skipped,
            percentage: percentage(session.items_processed, session.items_total),
            is_complete: session.status.is_terminal(),
            message: session.message,
        })
    }
}

/// Rounded percent of work done, clamped to 100 so an estimated total that
/// undershoots never reports past the end. Zero total reports zero.
fn percentage(processed: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (processed as f64 / total as f64 * 100.0).round();
    pct.min(100.0) as u8
}
