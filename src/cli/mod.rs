//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no orchestration logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use commands::Commands;

/// Fatbuild - build universal (fat) packages from single-architecture recipes
///
/// Replays a recipe's build, package and test steps once per requested
/// architecture and merges the results, combining binaries with lipo.
#[derive(Parser, Debug)]
#[command(name = "fatbuild")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Global configuration file (defaults to config.toml in the config dir)
    #[arg(long, global = true, env = "FATBUILD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        if let Some(cmd) = self.command {
            let globals = commands::GlobalArgs {
                config: self.config,
                json: self.json,
                quiet: self.quiet,
            };
            cmd.run(&globals).await
        } else {
            // No subcommand provided, show help
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
