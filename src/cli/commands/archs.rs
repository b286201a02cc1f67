//! Archs command implementation
//!
//! Implements `fatbuild archs` to show which architectures a recipe resolves
//! to and whether multi-arch orchestration would engage. Nothing is built.

use anyhow::Result;

use crate::cli::commands::{GlobalArgs, RecipeArgs};
use crate::cli::output::status;
use crate::core::arch::{self, Arch};
use crate::core::gate::{self, Orchestration};

/// Execute the archs command
pub async fn execute(args: &RecipeArgs, globals: &GlobalArgs) -> Result<()> {
    let config = globals.load_config()?;
    let ctx = args.load_context()?;

    let resolved = arch::resolve(&ctx.settings);
    let archs: Vec<&str> = if resolved.is_multi() {
        resolved.archs().iter().map(Arch::as_str).collect()
    } else {
        ctx.settings.arch().into_iter().collect()
    };
    let decision = gate::evaluate(&ctx, &config.gate);

    if globals.json {
        let (mode, detail) = match &decision {
            Ok(Orchestration::MultiArch(_)) => ("multi_arch", serde_json::Value::Null),
            Ok(Orchestration::PackageFilterOnly(patterns)) => {
                ("package_filter", serde_json::json!(patterns))
            }
            Err(reason) => ("declined", serde_json::json!(reason.to_string())),
        };
        let json = serde_json::json!({
            "recipe": ctx.display_name(),
            "os": ctx.settings.os(),
            "archs": archs,
            "mode": mode,
            "detail": detail,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("{}", ctx.display_name());
    println!("  os:    {}", ctx.settings.os().unwrap_or("(none)"));
    if archs.is_empty() {
        println!("  archs: (none)");
    } else {
        println!("  archs: {}", archs.join(", "));
    }

    match decision {
        Ok(Orchestration::MultiArch(_)) => {
            println!(
                "{} Multi-arch build: one build per architecture, merged package",
                status::SUCCESS
            );
        }
        Ok(Orchestration::PackageFilterOnly(patterns)) => {
            println!(
                "{} Native multi-arch generator: single build, package filter {}",
                status::INFO,
                patterns.join(" ")
            );
        }
        Err(reason) => {
            println!("{} Single build: {reason}", status::INFO);
        }
    }
    Ok(())
}
