//! Toolchain command implementation
//!
//! Implements `fatbuild toolchain` to write the CMake toolchain file a recipe
//! step would see, without running anything.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::commands::{GlobalArgs, RecipeArgs};
use crate::cli::output::status;
use crate::core::toolchain::{self, ToolchainConfig};
use crate::infra::{filesystem, xcrun};

/// Execute the toolchain command
pub async fn execute(args: &RecipeArgs, output: Option<&Path>, globals: &GlobalArgs) -> Result<()> {
    let ctx = args.load_context()?;

    let sysroot = match (ctx.settings.os(), ctx.settings.arch()) {
        (Some(os), Some(arch)) => toolchain::apple_sdk_name(os, arch).and_then(xcrun::sdk_path),
        _ => None,
    };
    let Some(config) = ToolchainConfig::from_settings(&ctx.settings, sysroot)? else {
        if !globals.quiet {
            println!(
                "{} No toolchain needed for OS '{}'",
                status::INFO,
                ctx.settings.os().unwrap_or("(none)")
            );
        }
        return Ok(());
    };

    let dir = output.unwrap_or(&ctx.folders.build);
    filesystem::create_dir_all(dir)?;
    let path = config
        .write_to(dir)
        .with_context(|| format!("Failed to write toolchain into {}", dir.display()))?;

    if globals.json {
        let json = serde_json::json!({
            "path": path,
            "env": config.to_env_map(),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else if !globals.quiet {
        println!("{} Wrote {}", status::SUCCESS, path.display());
    }
    Ok(())
}
