//! Apple toolchain configuration
//!
//! Maps settings onto the CMake cross-compilation variables for Apple
//! platforms. The result is a plain value: it is rendered into a toolchain
//! file and an environment map for one step's subprocesses, and never
//! written into the process environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::defaults::{OS_VERSION_SETTING, TOOLCHAIN_FILE};
use crate::core::arch::{self, ArchSet};
use crate::core::settings::Settings;
use crate::error::ToolchainError;
use crate::infra::filesystem;

/// Operating systems of the Apple family
pub const APPLE_OS: &[&str] = &["Macos", "iOS", "watchOS", "tvOS"];

/// Whether `os` belongs to the Apple family
pub fn is_apple_os(os: &str) -> bool {
    APPLE_OS.contains(&os)
}

/// Apple architecture name for a settings architecture
pub fn to_apple_arch(os: &str, arch: &str) -> String {
    match arch {
        "armv8" if os == "watchOS" => "arm64_32",
        "x86" => "i386",
        "armv8" | "armv8_32" => "arm64",
        "armv8.3" => "arm64e",
        other => other,
    }
    .to_string()
}

/// `CMAKE_SYSTEM_NAME` for an OS
pub fn cmake_system_name(os: &str) -> String {
    if os == "Macos" {
        "Darwin".to_string()
    } else {
        os.to_string()
    }
}

/// `CMAKE_SYSTEM_PROCESSOR` for an architecture
pub fn cmake_system_processor(arch: &str) -> Option<&'static str> {
    match arch {
        "x86" => Some("i386"),
        "x86_64" => Some("x86_64"),
        "armv7" => Some("arm"),
        "armv8" => Some("aarch64"),
        _ => None,
    }
}

/// SDK name passed to `xcrun --sdk`
pub fn apple_sdk_name(os: &str, arch: &str) -> Option<&'static str> {
    let simulator = matches!(arch, "x86" | "x86_64");
    match (os, simulator) {
        ("Macos", _) => Some("macosx"),
        ("iOS", false) => Some("iphoneos"),
        ("iOS", true) => Some("iphonesimulator"),
        ("watchOS", false) => Some("watchos"),
        ("watchOS", true) => Some("watchsimulator"),
        ("tvOS", false) => Some("appletvos"),
        ("tvOS", true) => Some("appletvsimulator"),
        _ => None,
    }
}

/// CMake cross-compilation settings for one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainConfig {
    /// `CMAKE_SYSTEM_NAME`
    pub system_name: String,
    /// `CMAKE_SYSTEM_PROCESSOR`
    pub system_processor: Option<String>,
    /// `CMAKE_OSX_ARCHITECTURES`
    pub osx_architectures: Vec<String>,
    /// `CMAKE_OSX_DEPLOYMENT_TARGET`
    pub deployment_target: Option<String>,
    /// `CMAKE_OSX_SYSROOT`
    pub sysroot: Option<PathBuf>,
}

impl ToolchainConfig {
    /// Derive the toolchain from settings
    ///
    /// Returns `Ok(None)` for non-Apple targets. A multi-arch setting lists
    /// every architecture; otherwise only `arch` is used.
    pub fn from_settings(
        settings: &Settings,
        sysroot: Option<PathBuf>,
    ) -> Result<Option<Self>, ToolchainError> {
        let Some(os) = settings.os().filter(|os| is_apple_os(os)) else {
            return Ok(None);
        };

        let archs: Vec<String> = match arch::resolve(settings) {
            ArchSet::Multi(archs) => archs.iter().map(|a| a.as_str().to_string()).collect(),
            ArchSet::Single => settings.arch().map(str::to_string).into_iter().collect(),
        };
        if archs.is_empty() {
            return Err(ToolchainError::NoArchitecture);
        }

        Ok(Some(Self {
            system_name: cmake_system_name(os),
            system_processor: settings
                .arch()
                .and_then(cmake_system_processor)
                .map(str::to_string),
            osx_architectures: archs.iter().map(|a| to_apple_arch(os, a)).collect(),
            deployment_target: settings.get(OS_VERSION_SETTING).map(str::to_string),
            sysroot,
        }))
    }

    /// Render a CMake toolchain file
    pub fn render(&self) -> String {
        let mut lines = vec![
            "if(CMAKE_VERSION VERSION_GREATER_EQUAL 3.14)".to_string(),
            format!("  set(CMAKE_SYSTEM_NAME {})", self.system_name),
            "else()".to_string(),
            "  set(CMAKE_SYSTEM_NAME Darwin)".to_string(),
            "endif()".to_string(),
            "set(CMAKE_FIND_ROOT_PATH_MODE_PROGRAM BOTH)".to_string(),
            "set(CMAKE_FIND_ROOT_PATH_MODE_INCLUDE BOTH)".to_string(),
            "set(CMAKE_FIND_ROOT_PATH_MODE_LIBRARY BOTH)".to_string(),
            "set(CMAKE_FIND_ROOT_PATH_MODE_PACKAGE NEVER)".to_string(),
            format!(
                "set(CMAKE_OSX_ARCHITECTURES \"{}\")",
                self.osx_architectures.join(";")
            ),
        ];
        if let Some(target) = &self.deployment_target {
            lines.push(format!("set(CMAKE_OSX_DEPLOYMENT_TARGET \"{target}\")"));
        }
        if let Some(sysroot) = &self.sysroot {
            lines.push(format!("set(CMAKE_OSX_SYSROOT \"{}\")", sysroot.display()));
        }
        // Platform/Darwin.cmake expects the Darwin kernel version here
        lines.push("set(CMAKE_SYSTEM_VERSION \"${CMAKE_HOST_SYSTEM_VERSION}\")".to_string());
        if let Some(processor) = &self.system_processor {
            lines.push(format!("set(CMAKE_SYSTEM_PROCESSOR \"{processor}\")"));
        }
        lines.push(String::new());
        lines.join("\n")
    }

    /// Write the toolchain file into `dir`
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ToolchainError> {
        let path = dir.join(TOOLCHAIN_FILE);
        filesystem::write_file(&path, &self.render())?;
        Ok(path)
    }

    /// Variables for a step's subprocess environment
    pub fn to_env_map(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert("CMAKE_SYSTEM_NAME".to_string(), self.system_name.clone());
        env.insert(
            "CMAKE_OSX_ARCHITECTURES".to_string(),
            self.osx_architectures.join(";"),
        );
        if let Some(processor) = &self.system_processor {
            env.insert("CMAKE_SYSTEM_PROCESSOR".to_string(), processor.clone());
        }
        if let Some(target) = &self.deployment_target {
            env.insert("CMAKE_OSX_DEPLOYMENT_TARGET".to_string(), target.clone());
        }
        if let Some(sysroot) = &self.sysroot {
            env.insert(
                "CMAKE_OSX_SYSROOT".to_string(),
                sysroot.display().to_string(),
            );
        }
        env
    }
}
