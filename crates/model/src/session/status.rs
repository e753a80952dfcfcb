use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an import session.
///
/// Transitions are linear: `Initializing -> InProgress -> Completed | Failed`.
/// Once a terminal state is reached the session never transitions again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Initializing,
    InProgress,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Initializing => "initializing",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }

    /// Active sessions hold the (store, resource type) execution slot.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Initializing | SessionStatus::InProgress)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
