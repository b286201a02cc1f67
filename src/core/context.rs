//! Build context and per-architecture cloning
//!
//! A [`BuildContext`] is split in two halves. The architecture-invariant part
//! ([`SharedState`]: recipe identity, generators, resolved dependencies) sits
//! behind an `Arc` and is shared by every clone. The per-architecture part
//! (settings, options, folders, output scope) is owned, so a clone can be
//! rewritten for one architecture without touching its parent or siblings.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::defaults::{ARCH_SETTING, FAT_ARCH_SETTING};
use crate::core::arch::Arch;
use crate::core::gate::Orchestration;
use crate::core::recipe::Recipe;
use crate::core::settings::{Options, Settings};
use crate::infra::copier::FileCopier;

/// Resolved metadata of one dependency
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Package root of the dependency
    pub root: PathBuf,
    /// Include directories, relative to `root`
    #[serde(default)]
    pub include_dirs: Vec<String>,
    /// Library directories, relative to `root`
    #[serde(default)]
    pub lib_dirs: Vec<String>,
    /// Libraries to link
    #[serde(default)]
    pub libs: Vec<String>,
}

/// Architecture-invariant state shared by all clones of a context
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    /// Recipe name
    pub name: String,
    /// Recipe version
    pub version: Option<String>,
    /// Generators the recipe uses (e.g. `cmake`)
    pub generators: Vec<String>,
    /// CMake generator selected for the build (e.g. `Xcode`, `Ninja`)
    pub cmake_generator: Option<String>,
    /// Resolved dependencies by name
    pub dependencies: BTreeMap<String, Dependency>,
}

/// Folder locations of a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folders {
    /// Recipe sources
    pub source: PathBuf,
    /// Build tree
    pub build: PathBuf,
    /// Install tree (generator output)
    pub install: PathBuf,
    /// Package output
    pub package: PathBuf,
}

impl Folders {
    /// Folders with the install tree inside the build tree
    pub fn new(source: PathBuf, build: PathBuf, package: PathBuf) -> Self {
        Self {
            source,
            install: build.clone(),
            build,
            package,
        }
    }
}

/// Log sink bound to a context's display name
#[derive(Debug, Clone)]
pub struct Output {
    scope: String,
}

impl Output {
    /// Sink for `scope`
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
        }
    }

    /// Name prefixed to every line
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Informational line
    pub fn info(&self, message: impl std::fmt::Display) {
        tracing::info!("{}: {}", self.scope, message);
    }

    /// Warning line
    pub fn warn(&self, message: impl std::fmt::Display) {
        tracing::warn!("{}: {}", self.scope, message);
    }

    /// Debug line
    pub fn debug(&self, message: impl std::fmt::Display) {
        tracing::debug!("{}: {}", self.scope, message);
    }
}

/// Everything a build, package or test step needs
#[derive(Clone)]
pub struct BuildContext {
    shared: Arc<SharedState>,
    /// Settings, owned per architecture
    pub settings: Settings,
    /// Options, owned per architecture
    pub options: Options,
    /// Folder locations, owned per architecture
    pub folders: Folders,
    display_name: String,
    output: Output,
    recipe: Arc<dyn Recipe>,
    orchestration: Option<Orchestration>,
    package_excludes: Vec<String>,
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("display_name", &self.display_name)
            .field("settings", &self.settings)
            .field("options", &self.options)
            .field("folders", &self.folders)
            .field("orchestration", &self.orchestration)
            .finish_non_exhaustive()
    }
}

impl BuildContext {
    /// Create a context for `recipe`
    pub fn new(
        shared: SharedState,
        settings: Settings,
        options: Options,
        folders: Folders,
        recipe: Arc<dyn Recipe>,
    ) -> Self {
        let display_name = shared.name.clone();
        Self {
            shared: Arc::new(shared),
            settings,
            options,
            folders,
            output: Output::new(display_name.clone()),
            display_name,
            recipe,
            orchestration: None,
            package_excludes: Vec::new(),
        }
    }

    /// Architecture-invariant state
    pub fn shared(&self) -> &SharedState {
        &self.shared
    }

    /// Name used in logs and errors (`name` or `name[arch]`)
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Log sink
    pub fn output(&self) -> &Output {
        &self.output
    }

    /// The recipe's own step implementations
    pub fn recipe(&self) -> &dyn Recipe {
        self.recipe.as_ref()
    }

    /// Orchestration installed on this context, if any
    pub fn orchestration(&self) -> Option<&Orchestration> {
        self.orchestration.as_ref()
    }

    /// Whether the gate already installed orchestration
    pub fn is_patched(&self) -> bool {
        self.orchestration.is_some()
    }

    pub(crate) fn install(&mut self, orchestration: Orchestration) {
        self.orchestration = Some(orchestration);
    }

    /// Patterns kept out of the package by the copier
    pub fn package_excludes(&self) -> &[String] {
        &self.package_excludes
    }

    /// Copy of this context whose copier also excludes `patterns`
    #[must_use]
    pub fn with_package_excludes(&self, patterns: &[String]) -> Self {
        let mut filtered = self.clone();
        filtered
            .package_excludes
            .extend(patterns.iter().cloned());
        filtered
    }

    /// File copier staging sources and build outputs into the package folder
    pub fn copier(&self) -> FileCopier {
        FileCopier::new(
            vec![self.folders.source.clone(), self.folders.build.clone()],
            self.folders.package.clone(),
        )
        .with_excludes(&self.package_excludes)
    }

    /// Isolated clone of this context bound to `arch`
    ///
    /// The clone gets its own settings (`arch` set, multi-arch list removed),
    /// build/install/package folders under the architecture's scratch
    /// directory, and a `name[arch]` display name. Sources, shared state and
    /// the recipe are shared with the parent.
    pub fn for_arch(&self, arch: &Arch) -> Self {
        let mut settings = self.settings.clone();
        settings.set(ARCH_SETTING, arch.as_str());
        settings.remove(FAT_ARCH_SETTING);

        let build = arch.scratch_dir(&self.folders.build);
        let folders = Folders {
            source: self.folders.source.clone(),
            install: build.clone(),
            build,
            package: arch.scratch_dir(&self.folders.package),
        };
        let display_name = format!("{}[{}]", self.display_name, arch);

        Self {
            shared: Arc::clone(&self.shared),
            settings,
            options: self.options.clone(),
            folders,
            output: Output::new(display_name.clone()),
            display_name,
            recipe: Arc::clone(&self.recipe),
            orchestration: None,
            package_excludes: self.package_excludes.clone(),
        }
    }
}
