use crate::{
    error::StateError,
    state::{CursorStore, ExecutionGuards, SessionStore},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::{
    core::identifiers::{SessionId, StoreId},
    core::resource::ResourceType,
    pagination::cursor::Cursor,
    session::record::{ImportSession, SessionPatch},
};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use std::path::Path;

const SESSION_PREFIX: &str = "session:";

/// Sled-backed store for sessions, cursors, and execution guards.
///
/// All three key families live in the same tree; mutating operations that
/// need check-then-set semantics run inside a sled transaction so overlapping
/// batch invocations for different sessions stay safe.
pub struct SledStateStore {
    db: sled::Db,
}

impl SledStateStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, sled::Error> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    #[inline]
    fn session_key(id: &SessionId) -> String {
        format!("{SESSION_PREFIX}{id}")
    }

    #[inline]
    fn cursor_key(resource: ResourceType) -> String {
        format!("cursor:{resource}")
    }

    #[inline]
    fn guard_key(id: &SessionId) -> String {
        format!("guard:{id}")
    }

    fn decode_session(bytes: &[u8]) -> Result<ImportSession, StateError> {
        bincode::deserialize(bytes).map_err(|e| StateError::Serialization(e.to_string()))
    }

    /// Scan every persisted session. Import volume is admin-triggered and
    /// bounded, so a prefix scan is the whole index.
    fn scan_sessions(&self) -> Result<Vec<ImportSession>, StateError> {
        let mut sessions = Vec::new();
        for item in self.db.scan_prefix(SESSION_PREFIX) {
            let (_key, value) = item?;
            sessions.push(Self::decode_session(&value)?);
        }
        Ok(sessions)
    }
}

#[async_trait]
impl SessionStore for SledStateStore {
    async fn create(&self, session: &ImportSession) -> Result<(), StateError> {
        let key = Self::session_key(&session.id);
        let bytes =
            bincode::serialize(session).map_err(|e| StateError::Serialization(e.to_string()))?;
        self.db.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    async fn find(&self, id: &SessionId) -> Result<Option<ImportSession>, StateError> {
        match self.db.get(Self::session_key(id))? {
            Some(bytes) => Ok(Some(Self::decode_session(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: &SessionId, patch: &SessionPatch) -> Result<bool, StateError> {
        let key = Self::session_key(id);
        let patch = patch.clone();

        // Atomic read-modify-write so a concurrent update for another
        // session (or a reaper sweep) never sees a torn record.
        let result = self.db.transaction::<_, bool, String>(move |tx_db| {
            let Some(existing) = tx_db.get(&key)? else {
                return Ok(false);
            };
            let mut session: ImportSession = bincode::deserialize(&existing)
                .map_err(|e| ConflictableTransactionError::Abort(e.to_string()))?;
            session.apply(&patch);
            let bytes = bincode::serialize(&session)
                .map_err(|e| ConflictableTransactionError::Abort(e.to_string()))?;
            tx_db.insert(key.as_bytes(), bytes)?;
            Ok(true)
        });

        match result {
            Ok(found) => Ok(found),
            Err(TransactionError::Abort(msg)) => Err(StateError::Serialization(msg)),
            Err(TransactionError::Storage(e)) => Err(StateError::Store(e)),
        }
    }

    async fn find_active(
        &self,
        store: &StoreId,
        resource: ResourceType,
    ) -> Result<Option<ImportSession>, StateError> {
        let active = self
            .scan_sessions()?
            .into_iter()
            .find(|s| s.store == *store && s.resource == resource && s.status.is_active());
        Ok(active)
    }

    async fn find_stuck(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<ImportSession>, StateError> {
        let stuck = self
            .scan_sessions()?
            .into_iter()
            .filter(|s| s.status.is_active() && s.updated_at < older_than)
            .collect();
        Ok(stuck)
    }

    async fn count_running(&self, excluding: Option<&SessionId>) -> Result<u64, StateError> {
        let count = self
            .scan_sessions()?
            .iter()
            .filter(|s| s.status.is_active() && excluding != Some(&s.id))
            .count();
        Ok(count as u64)
    }
}

#[async_trait]
impl CursorStore for SledStateStore {
    async fn get(&self, resource: ResourceType) -> Result<Option<Cursor>, StateError> {
        match self.db.get(Self::cursor_key(resource))? {
            Some(bytes) => {
                let cursor = bincode::deserialize(&bytes)
                    .map_err(|e| StateError::Serialization(e.to_string()))?;
                Ok(Some(cursor))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, resource: ResourceType, cursor: &Cursor) -> Result<(), StateError> {
        let bytes =
            bincode::serialize(cursor).map_err(|e| StateError::Serialization(e.to_string()))?;
        self.db.insert(Self::cursor_key(resource).as_bytes(), bytes)?;
        Ok(())
    }

    async fn clear(&self, resource: ResourceType) -> Result<(), StateError> {
        self.db.remove(Self::cursor_key(resource))?;
        Ok(())
    }
}

#[async_trait]
impl ExecutionGuards for SledStateStore {
    async fn try_acquire(&self, session: &SessionId, ttl_secs: u64) -> Result<bool, StateError> {
        let key = Self::guard_key(session);
        let now = Utc::now();
        let expiry = now + chrono::Duration::seconds(ttl_secs as i64);

        // Check-then-set in one transaction: two near-simultaneous triggers
        // of the same batch must not both win.
        let result = self.db.transaction::<_, bool, String>(move |tx_db| {
            if let Some(existing) = tx_db.get(&key)? {
                let held_until: DateTime<Utc> = bincode::deserialize(&existing)
                    .map_err(|e| ConflictableTransactionError::Abort(e.to_string()))?;
                if held_until > now {
                    return Ok(false);
                }
            }
            let bytes = bincode::serialize(&expiry)
                .map_err(|e| ConflictableTransactionError::Abort(e.to_string()))?;
            tx_db.insert(key.as_bytes(), bytes)?;
            Ok(true)
        });

        match result {
            Ok(acquired) => Ok(acquired),
            Err(TransactionError::Abort(msg)) => Err(StateError::Serialization(msg)),
            Err(TransactionError::Storage(e)) => Err(StateError::Store(e)),
        }
    }

    async fn release(&self, session: &SessionId) -> Result<(), StateError> {
        self.db.remove(Self::guard_key(session))?;
        Ok(())
    }
}
