//! Merge command implementation
//!
//! Implements `fatbuild merge` to graft one directory tree onto another.
//! Existing destination files are kept.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::cli::commands::GlobalArgs;
use crate::cli::output::{create_spinner, status, OutputConfig};
use crate::core::merge;

/// Execute the merge command
pub async fn execute(src: &Path, dst: &Path, globals: &GlobalArgs) -> Result<()> {
    if !src.is_dir() {
        bail!("Source {} is not a directory", src.display());
    }

    let visible = !globals.json && OutputConfig::new(globals.quiet, 0).show_progress();
    let spinner = create_spinner(&format!("Merging {}...", src.display()), visible);
    let result = merge::merge_tree(src, dst);
    spinner.finish_and_clear();

    let stats =
        result.with_context(|| format!("Failed to merge {} into {}", src.display(), dst.display()))?;

    if globals.json {
        let json = serde_json::json!({
            "copied": stats.copied,
            "skipped": stats.skipped,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else if !globals.quiet {
        println!(
            "{} Merged {} into {}: {} copied, {} already present",
            status::SUCCESS,
            src.display(),
            dst.display(),
            stats.copied,
            stats.skipped
        );
    }
    Ok(())
}
