//! Command implementations for the evomem CLI.
//!
//! Each submodule implements the logic for a command group.

pub mod config;
pub mod demo;
pub mod sessions;
