//! evomem-core - Experience memory for research agents
//!
//! This crate provides the in-process memory layer of an autonomous research
//! agent:
//!
//! - **learning**: Categorized, importance-ranked experience memories and
//!   experiment deduplication
//! - **conversation**: Bounded per-session dialogue windows
//! - **session**: Multi-session registry with persistence and LRU eviction
//! - **config**: Tunables for both layers

pub mod config;
pub mod conversation;
pub mod error;
pub mod learning;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use config::{CapacityPolicy, EvomemConfig, MemoryConfig, SessionConfig};
pub use conversation::{ChatMessage, ConversationTurn, ConversationWindow, Role};
pub use error::{Error, Result};
pub use learning::{LearningMemoryStore, Memory, MemoryCategory, MemoryQuery, MemoryStats};
pub use session::{SessionRegistry, SessionStorage};
