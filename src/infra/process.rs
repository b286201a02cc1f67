//! Shell command execution for recipe steps

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use crate::error::RecipeError;

fn shell(command: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    }
    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

/// Run `command` through the shell in `cwd`
///
/// `env` is added to the child's environment only. Tool output streams to
/// stderr, keeping stdout free for command reports.
pub fn run_shell(
    command: &str,
    cwd: &Path,
    env: &HashMap<String, String>,
) -> Result<(), RecipeError> {
    tracing::debug!("Running `{command}` in {}", cwd.display());

    let failed = |status: String| RecipeError::CommandFailed {
        command: command.to_string(),
        cwd: cwd.to_path_buf(),
        status,
    };

    let status = shell(command)
        .current_dir(cwd)
        .envs(env)
        .stdout(std::io::stderr())
        .status()
        .map_err(|e| failed(format!("failed to start: {e}")))?;

    if status.success() {
        Ok(())
    } else {
        Err(failed(status.to_string()))
    }
}
