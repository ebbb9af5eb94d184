//! Session registry types and the persisted record format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::{ConversationTurn, ConversationWindow};

/// Bookkeeping for one session.
///
/// Always derived from the owning window, so `message_count` cannot drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub message_count: usize,
    pub max_history: usize,
}

impl SessionMetadata {
    pub(crate) fn of(window: &ConversationWindow) -> Self {
        Self {
            created_at: window.created_at(),
            last_accessed: window.last_accessed(),
            message_count: window.len(),
            max_history: window.max_history(),
        }
    }
}

/// An active session as listed by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    #[serde(flatten)]
    pub metadata: SessionMetadata,
}

/// Durable form of a session, one per storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub metadata: SessionMetadata,
    pub messages: Vec<ConversationTurn>,
}

impl SessionRecord {
    /// Snapshot a window.
    pub fn capture(session_id: &str, window: &ConversationWindow) -> Self {
        Self {
            session_id: session_id.to_string(),
            metadata: SessionMetadata::of(window),
            messages: window.turns(true),
        }
    }
}

/// Registry statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub active_sessions: usize,
    pub total_messages: usize,
    pub max_sessions: usize,
    pub storage: String,
}
