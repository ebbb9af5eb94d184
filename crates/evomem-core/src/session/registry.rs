//! Multi-session registry with persistence and LRU eviction.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::storage::{validate_session_id, FileSessionStorage, SessionStorage};
use super::types::{RegistryStats, SessionInfo, SessionMetadata, SessionRecord};
use crate::config::SessionConfig;
use crate::conversation::{ConversationTurn, ConversationWindow, Role};
use crate::error::{Error, Result};
use crate::utils::{Clock, SystemClock};

struct ActiveSession {
    window: ConversationWindow,
    /// Tie-breaker for equal last-accessed timestamps
    access_seq: u64,
}

/// Registry of active conversation windows keyed by session id.
///
/// Keeps at most `max_sessions` sessions active, evicting the least recently
/// accessed ones after each creation. Sessions found in storage are loaded
/// when the registry is constructed. Not synchronized: wrap the whole registry
/// in one lock when shared, since eviction touches every session.
pub struct SessionRegistry {
    config: SessionConfig,
    storage: Box<dyn SessionStorage>,
    clock: Arc<dyn Clock>,
    sessions: HashMap<String, ActiveSession>,
    next_seq: u64,
}

impl SessionRegistry {
    /// Open a registry persisting to `config.storage_dir`.
    pub fn open(config: SessionConfig) -> Result<Self> {
        let storage = FileSessionStorage::new(config.storage_dir.clone());
        Self::with_storage(config, Box::new(storage), Arc::new(SystemClock))
    }

    /// Open a registry over explicit storage and time source.
    pub fn with_storage(
        config: SessionConfig,
        storage: Box<dyn SessionStorage>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let mut registry = Self {
            config,
            storage,
            clock,
            sessions: HashMap::new(),
            next_seq: 0,
        };
        registry.rehydrate();

        info!(
            "Session registry opened at {} with {} session(s)",
            registry.storage.describe(),
            registry.sessions.len()
        );
        Ok(registry)
    }

    /// Get the configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Create an empty session and return its id.
    ///
    /// Without an id one is synthesized from the current time. Fails if the
    /// id is already active. May evict the least recently accessed sessions,
    /// including their persisted copies.
    pub fn create_session(
        &mut self,
        session_id: Option<&str>,
        max_history: Option<usize>,
    ) -> Result<String> {
        let session_id = match session_id {
            Some(id) => {
                validate_session_id(id)?;
                id.to_string()
            }
            None => self.synthesize_id(),
        };

        if self.sessions.contains_key(&session_id) {
            return Err(Error::SessionExists(session_id));
        }

        let max_history = max_history.unwrap_or(self.config.default_max_history);
        let window = ConversationWindow::with_clock(max_history, self.clock.clone());
        let access_seq = self.bump_seq();
        self.sessions
            .insert(session_id.clone(), ActiveSession { window, access_seq });

        debug!("Created session {} (max_history={})", session_id, max_history);

        self.evict_overflow(&session_id);
        Ok(session_id)
    }

    /// Append a turn to a session.
    pub fn add_message(&mut self, session_id: &str, role: Role, content: &str) -> Result<()> {
        let seq = self.bump_seq();
        let session = self.resolve_mut(session_id)?;
        session.window.append(role, content);
        session.access_seq = seq;
        Ok(())
    }

    /// Read a session's turns in order, optionally without system turns.
    pub fn get_messages(
        &mut self,
        session_id: &str,
        include_system: bool,
    ) -> Result<Vec<ConversationTurn>> {
        Ok(self.session(session_id)?.turns(include_system))
    }

    /// Resolve a session window for reading. Counts as an access.
    pub fn session(&mut self, session_id: &str) -> Result<&ConversationWindow> {
        let seq = self.bump_seq();
        let session = self.resolve_mut(session_id)?;
        session.window.touch();
        session.access_seq = seq;
        Ok(&session.window)
    }

    /// Empty a session's window.
    pub fn clear_session(&mut self, session_id: &str) -> Result<()> {
        let seq = self.bump_seq();
        let session = self.resolve_mut(session_id)?;
        session.window.clear();
        session.access_seq = seq;
        Ok(())
    }

    /// Metadata for one session, without counting as an access.
    pub fn metadata(&self, session_id: &str) -> Result<SessionMetadata> {
        self.sessions
            .get(session_id)
            .map(|s| SessionMetadata::of(&s.window))
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    /// Persist a session. On failure the in-memory session is unchanged.
    pub fn save_session(&self, session_id: &str) -> Result<()> {
        let session = self
            .sessions
            .get(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;

        let record = SessionRecord::capture(session_id, &session.window);
        self.storage.save(&record)?;

        debug!("Saved session {} ({} messages)", session_id, record.messages.len());
        Ok(())
    }

    /// Restore a session from storage and make it active.
    ///
    /// Returns false, leaving the registry untouched, when nothing is stored
    /// or the stored record is unreadable.
    pub fn load_session(&mut self, session_id: &str) -> bool {
        if let Err(e) = validate_session_id(session_id) {
            warn!("Refusing to load session {:?}: {}", session_id, e);
            return false;
        }

        let record = match self.storage.load(session_id) {
            Ok(Some(record)) => record,
            Ok(None) => return false,
            Err(e) => {
                warn!("Failed to load session {}: {}", session_id, e);
                return false;
            }
        };

        if let Err(reason) = check_record(session_id, &record) {
            warn!("Ignoring corrupt record for session {}: {}", session_id, reason);
            return false;
        }

        let window = ConversationWindow::restore(
            record.metadata.max_history,
            record.messages,
            record.metadata.created_at,
            record.metadata.last_accessed,
            self.clock.clone(),
        );
        let access_seq = self.bump_seq();
        self.sessions
            .insert(session_id.to_string(), ActiveSession { window, access_seq });

        debug!("Loaded session {}", session_id);
        true
    }

    /// Remove a session and its persisted copy. Absent sessions are fine;
    /// ids that are not valid storage keys are rejected.
    pub fn delete_session(&mut self, session_id: &str) -> Result<()> {
        validate_session_id(session_id)?;

        if self.sessions.remove(session_id).is_some() {
            debug!("Deleted session {}", session_id);
        }
        self.storage.delete(session_id)
    }

    /// All active sessions, most recently accessed first.
    pub fn list_sessions(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<(&String, &ActiveSession)> = self.sessions.iter().collect();
        sessions.sort_by(|a, b| {
            b.1.window
                .last_accessed()
                .cmp(&a.1.window.last_accessed())
                .then_with(|| b.1.access_seq.cmp(&a.1.access_seq))
        });

        sessions
            .into_iter()
            .map(|(id, s)| SessionInfo {
                session_id: id.clone(),
                metadata: SessionMetadata::of(&s.window),
            })
            .collect()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Get registry statistics.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            active_sessions: self.sessions.len(),
            total_messages: self.sessions.values().map(|s| s.window.len()).sum(),
            max_sessions: self.config.max_sessions,
            storage: self.storage.describe(),
        }
    }

    fn resolve_mut(&mut self, session_id: &str) -> Result<&mut ActiveSession> {
        self.sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn synthesize_id(&self) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("session_{}_{}", self.clock.now().timestamp(), &suffix[..8])
    }

    /// Load every stored session. Unreadable records are skipped.
    fn rehydrate(&mut self) {
        let ids = match self.storage.list_ids() {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Failed to scan session storage {}: {}", self.storage.describe(), e);
                return;
            }
        };

        for id in ids {
            if !self.load_session(&id) {
                debug!("Skipped stored session {}", id);
            }
        }

        // Sequence follows stored access times so LRU ties stay meaningful
        let mut order: Vec<(String, chrono::DateTime<chrono::Utc>)> = self
            .sessions
            .iter()
            .map(|(id, s)| (id.clone(), s.window.last_accessed()))
            .collect();
        order.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        for (id, _) in order {
            let seq = self.bump_seq();
            if let Some(session) = self.sessions.get_mut(&id) {
                session.access_seq = seq;
            }
        }
    }

    /// Evict least recently accessed sessions until within `max_sessions`.
    /// `keep` is never evicted. Storage failures are logged, not returned.
    fn evict_overflow(&mut self, keep: &str) {
        while self.sessions.len() > self.config.max_sessions {
            let victim = self
                .sessions
                .iter()
                .filter(|(id, _)| id.as_str() != keep)
                .min_by(|a, b| {
                    a.1.window
                        .last_accessed()
                        .cmp(&b.1.window.last_accessed())
                        .then_with(|| a.1.access_seq.cmp(&b.1.access_seq))
                })
                .map(|(id, _)| id.clone());

            let Some(victim) = victim else { break };

            self.sessions.remove(&victim);
            if let Err(e) = self.storage.delete(&victim) {
                warn!("Failed to remove persisted copy of evicted session {}: {}", victim, e);
            }
            info!("Evicted least recently used session {}", victim);
        }
    }
}

fn check_record(session_id: &str, record: &SessionRecord) -> std::result::Result<(), String> {
    if record.session_id != session_id {
        return Err(format!("record is for session {}", record.session_id));
    }

    if record.metadata.message_count != record.messages.len() {
        return Err(format!(
            "message_count {} does not match {} stored messages",
            record.metadata.message_count,
            record.messages.len()
        ));
    }

    Ok(())
}
