//! Platform-specific directory management
//!
//! Locates the configuration directory holding the global `config.toml`.
//! Follows XDG Base Directory conventions on Linux and standard locations on
//! macOS. `FATBUILD_CONFIG_DIR` overrides the default.

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the config directory
pub const ENV_CONFIG_DIR: &str = "FATBUILD_CONFIG_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "fatbuild";

/// Global config file name
const CONFIG_FILE: &str = "config.toml";

/// Directory provider for fatbuild
#[derive(Debug, Clone)]
pub struct FatbuildDirs {
    config_dir: PathBuf,
}

impl FatbuildDirs {
    /// Resolve directories from the environment, then platform defaults
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_dir: Self::resolve_config_dir(),
        }
    }

    /// Directories rooted at an explicit config directory
    #[cfg(test)]
    #[must_use]
    pub fn with_config_dir(config_dir: impl AsRef<std::path::Path>) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
        }
    }

    /// Get the config directory path
    ///
    /// - Linux: `$XDG_CONFIG_HOME/fatbuild` or `~/.config/fatbuild`
    /// - macOS: `~/Library/Application Support/fatbuild`
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Path to `config.toml` in the config directory
    #[must_use]
    pub fn global_config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    fn resolve_config_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_CONFIG_DIR) {
            return PathBuf::from(path);
        }

        Self::platform_config_dir()
    }

    fn platform_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                // Fallback to home directory
                dirs::home_dir()
                    .map(|h| h.join(".config").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
            })
    }
}

impl Default for FatbuildDirs {
    fn default() -> Self {
        Self::new()
    }
}
