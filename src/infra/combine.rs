//! External architecture-combining tool
//!
//! Wraps `lipo`-style tools invoked as `TOOL -create -output OUT IN...`.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::CombineError;

/// Runs the combining tool
#[derive(Debug, Clone)]
pub struct Combiner {
    tool: String,
}

impl Combiner {
    /// Combiner for `tool` (a program name looked up in `PATH`, or a path)
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }

    /// Configured tool
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Locate the tool executable
    pub fn resolve(&self) -> Result<PathBuf, CombineError> {
        which::which(&self.tool).map_err(|_| CombineError::ToolNotFound {
            tool: self.tool.clone(),
        })
    }

    /// Arguments passed for one combine call
    pub fn args(output: &Path, inputs: &[PathBuf]) -> Vec<std::ffi::OsString> {
        let mut args: Vec<std::ffi::OsString> = vec!["-create".into(), "-output".into()];
        args.push(output.as_os_str().to_owned());
        args.extend(inputs.iter().map(|p| p.as_os_str().to_owned()));
        args
    }

    /// Combine `inputs` into one universal binary at `output`
    pub fn combine(&self, output: &Path, inputs: &[PathBuf]) -> Result<(), CombineError> {
        let program = self.resolve()?;
        tracing::debug!(
            "Running {} -create -output {} ({} inputs)",
            program.display(),
            output.display(),
            inputs.len()
        );

        let result = Command::new(&program)
            .args(Self::args(output, inputs))
            .output()
            .map_err(|e| CombineError::SpawnFailed {
                tool: self.tool.clone(),
                error: e.to_string(),
            })?;

        if !result.status.success() {
            return Err(CombineError::Failed {
                output: output.to_path_buf(),
                inputs: inputs.to_vec(),
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
