//! Architecture resolution
//!
//! Derives the ordered set of architectures a build must produce from the
//! multi-arch setting. Anything short of two distinct architectures resolves
//! to [`ArchSet::Single`], which turns orchestration into a pass-through.

use std::path::{Path, PathBuf};

use crate::config::defaults::{ARCH_DELIMITER, ARCH_FOLDER, ARCH_SETTING, FAT_ARCH_SETTING};
use crate::core::settings::Settings;

/// One architecture of a multi-arch build (e.g. `armv7`, `armv8`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Arch(String);

impl Arch {
    /// Create an architecture identifier
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Scratch directory for this architecture under `root`
    pub fn scratch_dir(&self, root: &Path) -> PathBuf {
        root.join(ARCH_FOLDER).join(&self.0)
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolved architecture set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchSet {
    /// One architecture (or none): no multiplication
    Single,
    /// Two or more architectures in configuration order
    Multi(Vec<Arch>),
}

impl ArchSet {
    /// Architectures of a multi-arch set, empty for [`ArchSet::Single`]
    pub fn archs(&self) -> &[Arch] {
        match self {
            ArchSet::Single => &[],
            ArchSet::Multi(archs) => archs,
        }
    }

    /// Whether orchestration has anything to multiply
    pub fn is_multi(&self) -> bool {
        matches!(self, ArchSet::Multi(_))
    }
}

/// Split a delimited architecture list, dropping blanks and duplicates
///
/// First occurrence wins, so configuration order is preserved.
pub fn parse_arch_list(value: &str) -> Vec<Arch> {
    let mut archs: Vec<Arch> = Vec::new();
    for name in value.split(ARCH_DELIMITER).map(str::trim) {
        if name.is_empty() || archs.iter().any(|a| a.as_str() == name) {
            continue;
        }
        archs.push(Arch::new(name));
    }
    archs
}

/// Resolve the architectures to build from `settings`
pub fn resolve(settings: &Settings) -> ArchSet {
    if !settings.has(ARCH_SETTING) {
        return ArchSet::Single;
    }
    let Some(value) = settings.get(FAT_ARCH_SETTING) else {
        return ArchSet::Single;
    };
    let archs = parse_arch_list(value);
    if archs.len() > 1 {
        ArchSet::Multi(archs)
    } else {
        ArchSet::Single
    }
}
