//! Fatbuild CLI - universal (fat) package builds
//!
//! Entry point for the fatbuild command-line application.

use anyhow::Result;
use clap::Parser;

use fatbuild::cli::output::{display_error, OutputConfig};
use fatbuild::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output_config = OutputConfig::new(cli.quiet, cli.verbose);

    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(output_config.level().into())
                .from_env_lossy(),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Run the command and handle errors
    match cli.run().await {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e);
            std::process::exit(1);
        }
    }
}
