//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this configuration file
//! - `--debug`: Enable debug logging

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// repometa - ordered, authority-controlled metadata for repository objects
#[derive(Parser, Debug)]
#[command(name = "repometa")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (overrides $REPOMETA_CONFIG and the default locations)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print an owner's metadata in place order
    #[command(
        name = "show",
        after_help = "\
EXAMPLES:
    # Every value of the owner
    repometa show item.json

    # Authors only, French with locale fallback
    repometa show item.json --field dc.contributor.author --lang fr"
    )]
    Show {
        /// Owner document (JSON)
        file: PathBuf,

        /// Field as schema.element[.qualifier]; '*' is a wildcard
        #[arg(long)]
        field: Option<String>,

        /// Language tag, or '*' for every language
        #[arg(long)]
        lang: Option<String>,
    },

    /// Renumber places and synchronize relationship places
    Renumber {
        /// Owner document (JSON)
        file: PathBuf,

        /// Rewrite the document instead of printing it
        #[arg(long)]
        write: bool,
    },

    /// Move a value within a field, then renumber
    #[command(
        name = "move",
        after_help = "\
EXAMPLES:
    # Make the second author the last one
    repometa move item.json --field dc.contributor.author --from 1 --to 2 --write"
    )]
    Move {
        /// Owner document (JSON)
        file: PathBuf,

        /// Field as schema.element[.qualifier]
        #[arg(long)]
        field: String,

        /// Current position
        #[arg(long)]
        from: usize,

        /// New position
        #[arg(long)]
        to: usize,

        /// Rewrite the document instead of printing it
        #[arg(long)]
        write: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_move() {
        let cli = Cli::try_parse_from([
            "repometa", "--debug", "move", "doc.json", "--field", "dc.title", "--from", "0", "--to", "2",
        ])
        .unwrap();
        assert!(cli.debug);
        match cli.command {
            Command::Move { from, to, write, .. } => {
                assert_eq!((from, to), (0, 2));
                assert!(!write);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["repometa", "show", "doc.json", "--config", "c.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
    }
}
