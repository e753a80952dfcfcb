use crate::{
    core::identifiers::{SessionId, StoreId},
    core::resource::ResourceType,
    filter::ImportOptions,
    session::status::SessionStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One run of importing one resource type from one source store.
///
/// This is the unit of idempotency and the record the polling client reads.
/// It is created in `Initializing`, mutated only by the batch processor and the
/// scheduler's reaper, and never deleted by the core.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ImportSession {
    pub id: SessionId,
    pub store: StoreId,
    pub resource: ResourceType,
    pub status: SessionStatus,

    pub items_total: u64,
    /// True when `items_total` came from a partial count and is an estimate.
    pub total_estimated: bool,
    pub items_processed: u64,
    pub items_succeeded: u64,
    pub items_failed: u64,
    pub items_skipped: u64,

    pub options: ImportOptions,

    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,

    /// Last human-readable status line, surfaced verbatim to the polling client.
    pub message: Option<String>,
}

impl ImportSession {
    pub fn new(store: StoreId, resource: ResourceType, options: ImportOptions) -> Self {
        let now = Utc::now();
        ImportSession {
            id: SessionId::generate(),
            store,
            resource,
            status: SessionStatus::Initializing,
            items_total: 0,
            total_estimated: false,
            items_processed: 0,
            items_succeeded: 0,
            items_failed: 0,
            items_skipped: 0,
            options,
            started_at: now,
            completed_at: None,
            updated_at: now,
            message: None,
        }
    }

    /// Apply a partial update, refreshing `updated_at`.
    pub fn apply(&mut self, patch: &SessionPatch) {
        if let Some(status) = patch.status {
            self.status = status;
            if status.is_terminal() && self.completed_at.is_none() {
                self.completed_at = Some(Utc::now());
            }
        }
        if let Some(total) = patch.items_total {
            self.items_total = total;
        }
        if let Some(estimated) = patch.total_estimated {
            self.total_estimated = estimated;
        }
        if let Some(processed) = patch.items_processed {
            self.items_processed = processed;
        }
        if let Some(succeeded) = patch.items_succeeded {
            self.items_succeeded = succeeded;
        }
        if let Some(failed) = patch.items_failed {
            self.items_failed = failed;
        }
        if let Some(skipped) = patch.items_skipped {
            self.items_skipped = skipped;
        }
        if let Some(message) = &patch.message {
            self.message = Some(message.clone());
        }
        self.updated_at = Utc::now();
    }
}

/// Partial-merge update for an [`ImportSession`]. Unset fields are left alone.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SessionPatch {
    pub status: Option<SessionStatus>,
    pub items_total: Option<u64>,
    pub total_estimated: Option<bool>,
    pub items_processed: Option<u64>,
    pub items_succeeded: Option<u64>,
    pub items_failed: Option<u64>,
    pub items_skipped: Option<u64>,
    pub message: Option<String>,
}

impl SessionPatch {
    pub fn status(status: SessionStatus) -> Self {
        SessionPatch {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
