//! Show the effective configuration.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::config::Config;

/// Execute config command.
pub fn execute(path_only: bool, explicit: Option<&Path>, config: &Config) -> Result<()> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path);

    if path_only {
        println!("{}", path.display());
        return Ok(());
    }

    let source = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    };
    println!("{} {}", "# Config:".dimmed(), source.dimmed());
    print!("{}", config.to_toml()?);

    Ok(())
}
