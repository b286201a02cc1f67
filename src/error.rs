//! Error types for fatbuild
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::runner::StepKind;

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to copy a tree
    #[error("Failed to copy '{src}' to '{dst}': {error}")]
    Copy {
        src: PathBuf,
        dst: PathBuf,
        error: String,
    },
}

/// A single file that could not be merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeFailure {
    /// Source entry
    pub src: PathBuf,
    /// Destination entry
    pub dst: PathBuf,
    /// Rendered I/O error
    pub error: String,
}

impl std::fmt::Display for MergeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {}: {}",
            self.src.display(),
            self.dst.display(),
            self.error
        )
    }
}

/// Tree merge errors
#[derive(Error, Debug)]
pub enum MergeError {
    /// One or more entries failed; the merge went as far as it could
    #[error("{}", render_failures(.failures))]
    Aggregate { failures: Vec<MergeFailure> },

    /// The combining tool failed; the merge was aborted
    #[error(transparent)]
    Combine(#[from] CombineError),
}

fn render_failures(failures: &[MergeFailure]) -> String {
    let noun = if failures.len() == 1 { "entry" } else { "entries" };
    let lines: Vec<String> = failures.iter().map(|f| format!("  {f}")).collect();
    format!("{} {noun} failed to merge:\n{}", failures.len(), lines.join("\n"))
}

impl MergeError {
    /// Wrap an I/O error on a single entry
    pub fn io(src: &std::path::Path, dst: &std::path::Path, error: &std::io::Error) -> Self {
        Self::Aggregate {
            failures: vec![MergeFailure {
                src: src.to_path_buf(),
                dst: dst.to_path_buf(),
                error: error.to_string(),
            }],
        }
    }
}

/// Architecture-combining tool errors
#[derive(Error, Debug)]
pub enum CombineError {
    /// Tool is not installed
    #[error("Combining tool '{tool}' not found in PATH")]
    ToolNotFound { tool: String },

    /// Tool could not be started
    #[error("Failed to run '{tool}': {error}")]
    SpawnFailed { tool: String, error: String },

    /// Tool exited with a failure status
    #[error("Combining {} into '{}' failed ({status}): {stderr}", render_paths(.inputs), .output.display())]
    Failed {
        output: PathBuf,
        inputs: Vec<PathBuf>,
        status: String,
        stderr: String,
    },
}

fn render_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Per-architecture orchestration errors
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// A recipe step failed for one architecture (or the single-arch context)
    #[error("{step} failed for '{scope}': {error}")]
    StepFailed {
        step: StepKind,
        scope: String,
        error: String,
    },

    /// Package or test ran before the architecture's build scratch existed
    #[error("Build folder for '{scope}' not found at '{path}'. Run the build step first")]
    MissingBuildScratch { scope: String, path: PathBuf },

    /// Staging the per-architecture build tree failed
    #[error("Failed to stage build tree for '{scope}': {source}")]
    Stage {
        scope: String,
        source: FilesystemError,
    },

    /// Reassembling the package failed
    #[error("Failed to merge package for '{scope}': {source}")]
    Merge { scope: String, source: MergeError },

    /// Scratch cleanup failed
    #[error("Failed to clean up scratch folders: {0}")]
    Cleanup(#[from] FilesystemError),
}

/// Recipe manifest errors
#[derive(Error, Debug)]
pub enum RecipeError {
    /// Recipe file not found
    #[error("Recipe not found at '{path}'")]
    NotFound { path: PathBuf },

    /// Recipe file could not be read
    #[error("Failed to read recipe '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Recipe file is not valid TOML
    #[error("Failed to parse recipe '{path}': {error}")]
    Parse { path: PathBuf, error: String },

    /// Recipe content is semantically invalid
    #[error("Invalid recipe: {message}")]
    Invalid { message: String },

    /// A step command exited with a failure status
    #[error("Command `{command}` failed in '{cwd}' ({status})")]
    CommandFailed {
        command: String,
        cwd: PathBuf,
        status: String,
    },
}

/// Toolchain setup errors
#[derive(Error, Debug)]
pub enum ToolchainError {
    /// No architecture to derive a toolchain from
    #[error("No architecture configured for toolchain setup")]
    NoArchitecture,

    /// Toolchain file could not be written
    #[error("Failed to write toolchain file: {0}")]
    Write(#[from] FilesystemError),
}
