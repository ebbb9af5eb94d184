//! Bounded per-session dialogue buffer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::Error;
use crate::utils::{Clock, SystemClock};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Convert to string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(Error::invalid_argument(
                "role",
                format!("unknown value '{}'; expected system, user or assistant", other),
            )),
        }
    }
}

/// One appended dialogue turn. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Timestamp-free view for building model requests.
    pub fn to_message(&self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Role and content only, as sent to a language model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Window statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub count: usize,
    pub max_history: usize,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
}

/// Ordered dialogue history holding at most `max_history` turns.
///
/// Appending past capacity discards the oldest turns first.
pub struct ConversationWindow {
    max_history: usize,
    turns: VecDeque<ConversationTurn>,
    created_at: DateTime<Utc>,
    last_accessed: DateTime<Utc>,
    clock: Arc<dyn Clock>,
}

impl ConversationWindow {
    /// Create an empty window reading wall-clock time.
    pub fn new(max_history: usize) -> Self {
        Self::with_clock(max_history, Arc::new(SystemClock))
    }

    /// Create an empty window with an explicit time source.
    ///
    /// A capacity of 0 is raised to 1.
    pub fn with_clock(max_history: usize, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            max_history: max_history.max(1),
            turns: VecDeque::new(),
            created_at: now,
            last_accessed: now,
            clock,
        }
    }

    /// Rebuild a window from persisted parts, keeping only the newest
    /// `max_history` turns.
    pub fn restore(
        max_history: usize,
        turns: Vec<ConversationTurn>,
        created_at: DateTime<Utc>,
        last_accessed: DateTime<Utc>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut window = Self {
            max_history: max_history.max(1),
            turns: turns.into(),
            created_at,
            last_accessed,
            clock,
        };
        window.evict_overflow();
        window
    }

    /// Append a turn stamped with the current time.
    pub fn append(&mut self, role: Role, content: impl Into<String>) -> &ConversationTurn {
        let now = self.clock.now();
        self.turns.push_back(ConversationTurn {
            role,
            content: content.into(),
            timestamp: now,
        });
        self.last_accessed = now;
        self.evict_overflow();

        // Capacity is at least 1, so the new turn is always retained
        &self.turns[self.turns.len() - 1]
    }

    /// Turns in chronological order, optionally without system turns.
    pub fn turns(&self, include_system: bool) -> Vec<ConversationTurn> {
        self.iter(include_system).cloned().collect()
    }

    /// Role/content pairs in chronological order, for model requests.
    pub fn messages(&self, include_system: bool) -> Vec<ChatMessage> {
        self.iter(include_system)
            .map(ConversationTurn::to_message)
            .collect()
    }

    /// Iterate over turns without copying.
    pub fn iter(&self, include_system: bool) -> impl Iterator<Item = &ConversationTurn> {
        self.turns
            .iter()
            .filter(move |t| include_system || t.role != Role::System)
    }

    /// Remove every turn. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.last_accessed = self.clock.now();
    }

    /// Refresh the last-accessed time after a read.
    pub fn touch(&mut self) {
        self.last_accessed = self.clock.now();
    }

    pub fn stats(&self) -> WindowStats {
        WindowStats {
            count: self.turns.len(),
            max_history: self.max_history,
            created_at: self.created_at,
            last_accessed: self.last_accessed,
        }
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_accessed(&self) -> DateTime<Utc> {
        self.last_accessed
    }

    fn evict_overflow(&mut self) {
        while self.turns.len() > self.max_history {
            self.turns.pop_front();
        }
    }
}

impl std::fmt::Debug for ConversationWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationWindow")
            .field("max_history", &self.max_history)
            .field("turns", &self.turns)
            .field("created_at", &self.created_at)
            .field("last_accessed", &self.last_accessed)
            .finish()
    }
}
