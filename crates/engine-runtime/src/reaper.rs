use engine_core::{error::StateError, settings::EngineSettings, state::SessionStore};
use model::{
    core::identifiers::SessionId,
    session::{record::SessionPatch, status::SessionStatus},
};
use std::sync::Arc;
use tracing::warn;

/// Periodic sweep that fails sessions stuck past the no-progress threshold.
///
/// A reaped session frees its (store, resource) slot so a new run can start.
/// The timeout message is distinct from a processing error so the polling
/// client can tell the two apart.
pub struct SessionReaper {
    sessions: Arc<dyn SessionStore>,
    settings: EngineSettings,
}

impl SessionReaper {
    pub fn new(sessions: Arc<dyn SessionStore>, settings: EngineSettings) -> Self {
        SessionReaper { sessions, settings }
    }

    pub async fn reap(&self) -> Result<Vec<SessionId>, StateError> {
        let threshold = self.settings.stuck_threshold_secs;
        let cutoff = chrono::Utc::now() - chrono::Duration::seconds(threshold as i64);
        let stuck = self.sessions.find_stuck(cutoff).await?;

        let mut reaped = Vec::with_capacity(stuck.len());
        for session in stuck {
            warn!(
                session = %session.id,
                store = %session.store,
                resource = %session.resource,
                updated_at = %session.updated_at,
                "Reaping stuck session"
            );
            let patch = SessionPatch::status(SessionStatus::Failed).with_message(format!(
                "Import timed out: no progress for over {threshold} seconds"
            ));
            if self.sessions.update(&session.id, &patch).await? {
                reaped.push(session.id);
            }
        }
        Ok(reaped)
    }
}
