//! Classify command implementation
//!
//! Implements `fatbuild classify` to report how the fat merge would treat
//! each file.

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::commands::GlobalArgs;
use crate::core::classify::{self, FileClass};

fn label(class: FileClass) -> &'static str {
    match class {
        FileClass::Binary => "binary",
        FileClass::Plain => "plain",
    }
}

/// Execute the classify command
pub async fn execute(files: &[PathBuf], globals: &GlobalArgs) -> Result<()> {
    let classes: Vec<(&PathBuf, FileClass)> =
        files.iter().map(|f| (f, classify::classify(f))).collect();

    if globals.json {
        let json: Vec<_> = classes
            .iter()
            .map(|(path, class)| {
                serde_json::json!({
                    "path": path,
                    "class": label(*class),
                    "magic": classify::sniff(path).map(|m| format!("{m:?}")),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    for (path, class) in classes {
        println!("{:<6} {}", label(class), path.display());
    }
    Ok(())
}
