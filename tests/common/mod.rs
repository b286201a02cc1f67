//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary directory holding a recipe and provides utilities
/// for setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a file with raw bytes in the test project
    pub fn create_bytes(&self, name: &str, content: &[u8]) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Path of the recipe manifest
    pub fn recipe_path(&self) -> PathBuf {
        self.dir.path().join("recipe.toml")
    }

    /// Write the recipe manifest
    pub fn write_recipe(&self, content: &str) {
        self.create_file("recipe.toml", content);
    }

    /// Install a fake combining tool and return its path
    ///
    /// The tool appends its arguments to `lipo.log` and concatenates its
    /// inputs into the output, so tests can check both the call and the result.
    #[cfg(unix)]
    pub fn fake_lipo(&self) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let tool = self.dir.path().join("tools/lipo");
        let log = self.lipo_log();
        self.create_file(
            "tools/lipo",
            &format!(
                "#!/bin/sh\necho \"$@\" >> '{}'\nshift 2\nout=$1\nshift\ncat \"$@\" > \"$out\"\n",
                log.display()
            ),
        );
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake lipo executable");
        tool
    }

    /// Path the fake combining tool logs to
    pub fn lipo_log(&self) -> PathBuf {
        self.dir.path().join("lipo.log")
    }

    /// Lines logged by the fake combining tool
    pub fn lipo_calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.lipo_log())
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Write a global config using `tool` as the combining tool
    pub fn write_config(&self, tool: &Path) -> PathBuf {
        self.create_file(
            "config.toml",
            &format!("[merge]\ncombine_tool = \"{}\"\n", tool.display()),
        );
        self.dir.path().join("config.toml")
    }

    /// Command for the fatbuild binary running in the project directory
    pub fn fatbuild(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_fatbuild"));
        cmd.current_dir(self.dir.path());
        cmd.env("FATBUILD_CONFIG_DIR", self.dir.path().join(".config"));
        cmd.env_remove("FATBUILD_CONFIG");
        cmd.env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Recipe producing a header and a static library per architecture
///
/// Every architecture writes the same header path with its own content, and
/// its name into `lib/libfoo.a`.
pub const FAT_RECIPE: &str = r#"
[recipe]
name = "foo"
version = "1.0"

[settings]
os = "iOS"
arch = "armv8"
"os.fat_arch" = "armv7;armv8"

[steps]
build = [
    "mkdir -p include lib",
    "printf '%s' \"$ARCH\" > include/foo.h",
    "printf '%s' \"$ARCH\" > lib/libfoo.a",
]
test = ["test -f lib/libfoo.a"]

[[package.copy]]
pattern = "*.h"
src = "include"
dst = "include"

[[package.copy]]
pattern = "*.a"
src = "lib"
dst = "lib"
"#;

/// Single-architecture recipe for a non-Apple target
pub const LINUX_RECIPE: &str = r#"
[recipe]
name = "bar"

[settings]
os = "Linux"
arch = "x86_64"

[steps]
build = ["mkdir -p lib", "printf '%s' \"$ARCH\" > lib/libbar.a"]

[[package.copy]]
pattern = "*.a"
src = "lib"
dst = "lib"
"#;
