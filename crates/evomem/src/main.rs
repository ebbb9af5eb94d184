//! evomem - Experience memory CLI
//!
//! Inspect persisted conversation sessions and walk through the learning
//! memory store.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;
mod config;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("evomem=info".parse()?))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = config::Config::load(cli.config.as_deref())?;

    // Execute command
    match cli.command {
        Commands::Sessions(cmd) => commands::sessions::execute(cmd, &config),
        Commands::Demo => commands::demo::execute(&config),
        Commands::Config { path } => commands::config::execute(path, cli.config.as_deref(), &config),
        Commands::Version => {
            println!("evomem {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
