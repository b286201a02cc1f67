//! Apple SDK lookup through `xcrun`

use std::path::PathBuf;
use std::process::Command;

/// Path of the SDK named `sdk`, or `None` when `xcrun` is unavailable or fails
pub fn sdk_path(sdk: &str) -> Option<PathBuf> {
    let xcrun = which::which("xcrun").ok()?;
    let output = match Command::new(xcrun)
        .args(["--sdk", sdk, "--show-sdk-path"])
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!("xcrun could not be started: {e}");
            return None;
        }
    };

    if !output.status.success() {
        tracing::debug!(
            "xcrun --sdk {sdk} failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }

    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!path.is_empty()).then(|| PathBuf::from(path))
}
