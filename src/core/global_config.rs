//! Global configuration management
//!
//! Reads tool-wide settings from `config.toml` in the config directory:
//! which combining tool to call, which generators already build every
//! architecture in one invocation, and which platforms get fat packages.

use crate::config::defaults::{
    DEFAULT_COMBINE_TOOL, DEFAULT_MULTI_ARCH_GENERATORS, DEFAULT_PACKAGE_FILTER,
};
use crate::infra::dirs::FatbuildDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Global configuration error types
#[derive(Error, Debug)]
pub enum GlobalConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: String, error: String },

    /// Failed to write config file
    #[error("Failed to write config file '{path}': {error}")]
    WriteError { path: String, error: String },
}

/// Global configuration for fatbuild
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Fat merge settings
    #[serde(default)]
    pub merge: MergeConfig,

    /// Eligibility gate settings
    #[serde(default)]
    pub gate: GateConfig,
}

/// Fat merge settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Program combining thin binaries into a universal one
    #[serde(default = "default_combine_tool")]
    pub combine_tool: String,

    /// Warn when architectures disagree on a plain file
    #[serde(default = "default_true")]
    pub check_plain_conflicts: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            combine_tool: default_combine_tool(),
            check_plain_conflicts: true,
        }
    }
}

/// Eligibility gate settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Generators that can build all architectures at once
    #[serde(default = "default_multi_arch_generators")]
    pub multi_arch_generators: Vec<String>,

    /// Operating systems treated like the Apple family
    #[serde(default)]
    pub extra_os: Vec<String>,

    /// Patterns kept out of packages built natively multi-arch
    #[serde(default = "default_package_filter")]
    pub package_filter: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            multi_arch_generators: default_multi_arch_generators(),
            extra_os: Vec::new(),
            package_filter: default_package_filter(),
        }
    }
}

fn default_combine_tool() -> String {
    DEFAULT_COMBINE_TOOL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_multi_arch_generators() -> Vec<String> {
    DEFAULT_MULTI_ARCH_GENERATORS
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_package_filter() -> Vec<String> {
    DEFAULT_PACKAGE_FILTER
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl GlobalConfig {
    /// Load global configuration from the config directory
    ///
    /// A missing file yields the defaults; an unreadable or invalid one is an error.
    pub fn load(dirs: &FatbuildDirs) -> Result<Self, GlobalConfigError> {
        Self::load_from_path(&dirs.global_config_path())
    }

    /// Load global configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, GlobalConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| GlobalConfigError::ReadError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| GlobalConfigError::ParseError {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Save global configuration to a specific path
    ///
    /// Creates parent directories if they don't exist.
    pub fn save_to_path(&self, path: &Path) -> Result<(), GlobalConfigError> {
        let write_error = |p: &Path, e: &dyn std::fmt::Display| GlobalConfigError::WriteError {
            path: p.display().to_string(),
            error: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_error(parent, &e))?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| write_error(path, &e))?;
        fs::write(path, content).map_err(|e| write_error(path, &e))
    }
}
