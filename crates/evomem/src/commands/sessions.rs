//! Session commands over the on-disk session registry.
//!
//! Opening the registry loads every record in `sessions.storage_dir`;
//! commands that modify a session persist it before returning.

use anyhow::{Context, Result, bail};
use colored::Colorize;
use evomem_core::conversation::{ConversationTurn, Role};
use evomem_core::session::SessionInfo;
use evomem_core::SessionRegistry;

use crate::cli::{SessionsAction, SessionsCommand};
use crate::config::Config;

/// Execute sessions command.
pub fn execute(cmd: SessionsCommand, config: &Config) -> Result<()> {
    let mut registry = open_registry(config)?;

    match cmd.action {
        SessionsAction::List { json } => list(&registry, json),
        SessionsAction::Show {
            session_id,
            no_system,
            json,
        } => show(&mut registry, &session_id, !no_system, json),
        SessionsAction::Create {
            session_id,
            max_history,
        } => create(&mut registry, session_id.as_deref(), max_history),
        SessionsAction::Append {
            session_id,
            role,
            content,
        } => append(&mut registry, &session_id, &role, &content),
        SessionsAction::Delete { session_id } => delete(&mut registry, &session_id),
        SessionsAction::Stats { json } => stats(&registry, json),
    }
}

fn open_registry(config: &Config) -> Result<SessionRegistry> {
    SessionRegistry::open(config.core.sessions.clone()).with_context(|| {
        format!(
            "Failed to open session registry at {}",
            config.core.sessions.storage_dir.display()
        )
    })
}

/// List active sessions.
fn list(registry: &SessionRegistry, json: bool) -> Result<()> {
    let sessions = registry.list_sessions();

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("{}", "No sessions found".yellow());
        return Ok(());
    }

    println!("{}", format!("Sessions ({})", sessions.len()).cyan().bold());
    for info in &sessions {
        print_session_line(info);
    }

    Ok(())
}

fn print_session_line(info: &SessionInfo) {
    let meta = &info.metadata;
    println!(
        "  {} {} messages (max {}), last accessed {}",
        info.session_id.bold(),
        meta.message_count,
        meta.max_history,
        meta.last_accessed.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
    );
}

/// Show a session's messages.
fn show(registry: &mut SessionRegistry, session_id: &str, include_system: bool, json: bool) -> Result<()> {
    let messages = registry
        .get_messages(session_id, include_system)
        .with_context(|| format!("Cannot show session {}", session_id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    let meta = registry.metadata(session_id)?;
    println!("{} {}", "Session".cyan().bold(), session_id.bold());
    println!(
        "  Created: {}  Messages: {}/{}",
        meta.created_at.format("%Y-%m-%d %H:%M:%S"),
        meta.message_count,
        meta.max_history
    );
    println!();

    if messages.is_empty() {
        println!("{}", "  (no messages)".dimmed());
    }
    for turn in &messages {
        print_turn(turn);
    }

    Ok(())
}

fn print_turn(turn: &ConversationTurn) {
    let role = match turn.role {
        Role::System => turn.role.as_str().magenta(),
        Role::User => turn.role.as_str().green(),
        Role::Assistant => turn.role.as_str().blue(),
    };
    println!(
        "  {} {}",
        format!("[{}]", turn.timestamp.format("%H:%M:%S")).dimmed(),
        role.bold()
    );
    for line in turn.content.lines() {
        println!("    {}", line);
    }
}

/// Create and persist an empty session.
fn create(
    registry: &mut SessionRegistry,
    session_id: Option<&str>,
    max_history: Option<usize>,
) -> Result<()> {
    let session_id = registry
        .create_session(session_id, max_history)
        .context("Failed to create session")?;
    registry
        .save_session(&session_id)
        .with_context(|| format!("Failed to save session {}", session_id))?;

    println!("{} Created session {}", "✓".green(), session_id.cyan());
    Ok(())
}

/// Append one message and persist the session.
fn append(registry: &mut SessionRegistry, session_id: &str, role: &str, content: &str) -> Result<()> {
    let role: Role = role.parse()?;

    if !registry.contains(session_id) {
        bail!("Session not found: {}. Create it with `evomem sessions create {}`", session_id, session_id);
    }

    registry.add_message(session_id, role, content)?;
    registry
        .save_session(session_id)
        .with_context(|| format!("Failed to save session {}", session_id))?;

    let meta = registry.metadata(session_id)?;
    println!(
        "{} Added {} message to {} ({}/{})",
        "✓".green(),
        role,
        session_id.cyan(),
        meta.message_count,
        meta.max_history
    );
    Ok(())
}

/// Delete a session and its record.
fn delete(registry: &mut SessionRegistry, session_id: &str) -> Result<()> {
    let existed = registry.contains(session_id);
    registry
        .delete_session(session_id)
        .with_context(|| format!("Failed to delete session {}", session_id))?;

    if existed {
        println!("{} Deleted session {}", "✓".green(), session_id.cyan());
    } else {
        println!("{} Session {} not found", "!".yellow(), session_id);
    }
    Ok(())
}

/// Show registry statistics.
fn stats(registry: &SessionRegistry, json: bool) -> Result<()> {
    let stats = registry.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "Session Registry".cyan().bold());
    println!("  Active sessions: {}/{}", stats.active_sessions, stats.max_sessions);
    println!("  Total messages:  {}", stats.total_messages);
    println!("  Storage:         {}", stats.storage);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use evomem_core::{EvomemConfig, SessionConfig};
    use tempfile::tempdir;

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            core: EvomemConfig::default().with_sessions(SessionConfig::new(dir)),
        }
    }

    #[test]
    fn test_create_append_then_reopen() {
        let temp = tempdir().expect("Failed to create temp dir");
        let config = config_in(temp.path());

        let mut registry = open_registry(&config).unwrap();
        create(&mut registry, Some("lab"), Some(4)).unwrap();
        append(&mut registry, "lab", "system", "be brief").unwrap();
        append(&mut registry, "lab", "user", "hello").unwrap();

        let mut reopened = open_registry(&config).unwrap();
        let messages = reopened.get_messages("lab", false).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hello");
        assert_eq!(reopened.metadata("lab").unwrap().max_history, 4);
    }

    #[test]
    fn test_append_rejects_unknown_session_and_role() {
        let temp = tempdir().expect("Failed to create temp dir");
        let mut registry = open_registry(&config_in(temp.path())).unwrap();

        assert!(append(&mut registry, "missing", "user", "hi").is_err());

        create(&mut registry, Some("s"), None).unwrap();
        assert!(append(&mut registry, "s", "robot", "hi").is_err());
    }

    #[test]
    fn test_delete_removes_record() {
        let temp = tempdir().expect("Failed to create temp dir");
        let config = config_in(temp.path());

        let mut registry = open_registry(&config).unwrap();
        create(&mut registry, Some("gone"), None).unwrap();
        delete(&mut registry, "gone").unwrap();
        delete(&mut registry, "gone").unwrap();

        let reopened = open_registry(&config).unwrap();
        assert!(!reopened.contains("gone"));
    }
}
