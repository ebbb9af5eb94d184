//! CLI argument definitions using clap derive macros.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Experience memory for research agents
///
/// Manage persisted conversation sessions and explore the learning store.
#[derive(Parser, Debug)]
#[command(name = "evomem")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "EVOMEM_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Conversation session management (list, show, delete)
    Sessions(SessionsCommand),

    /// Walk through the learning memory store with sample data
    Demo,

    /// Show the effective configuration
    Config {
        /// Print only the config file path
        #[arg(long)]
        path: bool,
    },

    /// Show version
    Version,
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct SessionsCommand {
    #[command(subcommand)]
    pub action: SessionsAction,
}

#[derive(Subcommand, Debug)]
pub enum SessionsAction {
    /// List stored sessions, most recently accessed first
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show a session's messages
    Show {
        /// Session ID
        session_id: String,

        /// Hide system messages
        #[arg(long)]
        no_system: bool,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Create an empty session and persist it
    Create {
        /// Session ID (generated when omitted)
        session_id: Option<String>,

        /// Maximum number of retained messages
        #[arg(long)]
        max_history: Option<usize>,
    },

    /// Append a message to a session and persist it
    Append {
        /// Session ID
        session_id: String,

        /// Speaker: system, user or assistant
        #[arg(short, long, default_value = "user")]
        role: String,

        /// Message content
        content: String,
    },

    /// Delete a session and its stored record
    Delete {
        /// Session ID
        session_id: String,
    },

    /// Show registry statistics
    Stats {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}
