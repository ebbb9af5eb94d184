//! Conversation windows: bounded, ordered dialogue history for one session.

mod window;

pub use window::{ChatMessage, ConversationTurn, ConversationWindow, Role, WindowStats};
