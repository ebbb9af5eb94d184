//! Session registry: many named conversation windows with durable storage.
//!
//! Each session owns a [`ConversationWindow`](crate::conversation::ConversationWindow).
//! The registry keeps at most `max_sessions` active and persists each one as a
//! single JSON record through a [`SessionStorage`] backend.

mod registry;
mod storage;
mod types;

pub use registry::SessionRegistry;
pub use storage::{validate_session_id, FileSessionStorage, MemorySessionStorage, SessionStorage};
pub use types::{RegistryStats, SessionInfo, SessionMetadata, SessionRecord};
