//! cli
//!
//! Command-line interface layer for repometa.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and build the engine's collaborators
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Owner documents are read through [`document`],
//! every metadata change goes through [`crate::engine::MetadataService`],
//! and results are printed or written back by the handlers.

pub mod args;
pub mod commands;
pub mod document;

pub use args::{Cli, Command};

use anyhow::{Context as _, Result};

use crate::core::config::Config;

/// Shared state for one CLI invocation.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub debug: bool,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    let ctx = Context {
        config,
        debug: cli.debug,
    };

    commands::dispatch(cli.command, &ctx)
}
