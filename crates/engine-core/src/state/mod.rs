use crate::error::StateError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::{
    core::identifiers::{SessionId, StoreId},
    core::resource::ResourceType,
    pagination::cursor::Cursor,
    session::record::{ImportSession, SessionPatch},
};

pub mod sled_store;

/// Persisted import-session records, keyed by session id.
///
/// `update` is a partial merge, safe to call concurrently for *different*
/// sessions; same-session double-update is prevented by the scheduler's
/// single-flight rule, not here.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: &ImportSession) -> Result<(), StateError>;

    async fn find(&self, id: &SessionId) -> Result<Option<ImportSession>, StateError>;

    /// Apply a partial update; returns false when the session does not exist.
    async fn update(&self, id: &SessionId, patch: &SessionPatch) -> Result<bool, StateError>;

    /// The session holding the (store, resource type) slot, if any
    /// (status `initializing` or `in_progress` only).
    async fn find_active(
        &self,
        store: &StoreId,
        resource: ResourceType,
    ) -> Result<Option<ImportSession>, StateError>;

    /// Sessions `in_progress` whose last update predates `older_than`.
    async fn find_stuck(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<ImportSession>, StateError>;

    async fn count_running(&self, excluding: Option<&SessionId>) -> Result<u64, StateError>;
}

/// One resumable pagination cursor per resource type.
///
/// A cursor is only advanced after its page has been fully processed, and is
/// cleared whenever a fresh (non-resume) import starts for that resource.
#[async_trait]
pub trait CursorStore: Send + Sync {
    async fn get(&self, resource: ResourceType) -> Result<Option<Cursor>, StateError>;

    async fn set(&self, resource: ResourceType, cursor: &Cursor) -> Result<(), StateError>;

    async fn clear(&self, resource: ResourceType) -> Result<(), StateError>;
}

/// Short-lived execution guards keyed by session id.
///
/// A guard stops two near-simultaneous triggers of the same scheduled batch
/// from both executing. It self-expires so a process dying mid-batch cannot
/// deadlock the session forever.
#[async_trait]
pub trait ExecutionGuards: Send + Sync {
    /// Returns true when the guard was acquired; false when another holder
    /// has an unexpired guard for this session.
    async fn try_acquire(&self, session: &SessionId, ttl_secs: u64) -> Result<bool, StateError>;

    async fn release(&self, session: &SessionId) -> Result<(), StateError>;
}
