//! Build environment setup
//!
//! Collects the environment variables handed to a recipe step's commands:
//! folder locations (SRCDIR, BUILDDIR, DESTDIR), the target (ARCH, OS),
//! parallelism (JOBS), dependency roots and the CMake toolchain variables.
//! The map is applied to child processes only.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::core::context::BuildContext;
use crate::core::toolchain::ToolchainConfig;

/// Build environment for one step of one context
#[derive(Debug, Clone, PartialEq)]
pub struct BuildEnvironment {
    /// Recipe sources
    pub srcdir: PathBuf,
    /// Build tree the step runs in
    pub builddir: PathBuf,
    /// Package output
    pub destdir: PathBuf,
    /// Target architecture
    pub arch: Option<String>,
    /// Target operating system
    pub os: Option<String>,
    /// Number of parallel jobs
    pub jobs: usize,
    /// Dependency package roots by name
    pub dependencies: BTreeMap<String, PathBuf>,
    /// Toolchain variables (`CMAKE_*`)
    pub toolchain: BTreeMap<String, String>,
    /// Generated CMake toolchain file
    pub toolchain_file: Option<PathBuf>,
    /// Additional environment variables
    pub extra_env: HashMap<String, String>,
}

impl BuildEnvironment {
    /// Environment derived from a context's folders, settings and dependencies
    pub fn for_context(ctx: &BuildContext) -> Self {
        Self {
            srcdir: ctx.folders.source.clone(),
            builddir: ctx.folders.build.clone(),
            destdir: ctx.folders.package.clone(),
            arch: ctx.settings.arch().map(str::to_string),
            os: ctx.settings.os().map(str::to_string),
            jobs: num_cpus::get(),
            dependencies: ctx
                .shared()
                .dependencies
                .iter()
                .map(|(name, dep)| (name.clone(), dep.root.clone()))
                .collect(),
            toolchain: BTreeMap::new(),
            toolchain_file: None,
            extra_env: HashMap::new(),
        }
    }

    /// Add the toolchain variables and its rendered file
    #[must_use]
    pub fn with_toolchain(mut self, config: &ToolchainConfig, file: PathBuf) -> Self {
        self.toolchain = config.to_env_map();
        self.toolchain_file = Some(file);
        self
    }

    /// Set the number of parallel jobs
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Add an extra environment variable
    #[must_use]
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.extra_env.insert(key.to_string(), value.to_string());
        self
    }

    /// Convert to environment variable map for process execution
    pub fn to_env_map(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();

        env.insert("SRCDIR".to_string(), self.srcdir.display().to_string());
        env.insert("BUILDDIR".to_string(), self.builddir.display().to_string());
        env.insert("DESTDIR".to_string(), self.destdir.display().to_string());
        env.insert("JOBS".to_string(), self.jobs.to_string());
        if let Some(arch) = &self.arch {
            env.insert("ARCH".to_string(), arch.clone());
        }
        if let Some(os) = &self.os {
            env.insert("OS".to_string(), os.clone());
        }

        for (name, root) in &self.dependencies {
            env.insert(
                format!("DEP_{}_ROOT", env_name(name)),
                root.display().to_string(),
            );
        }

        env.extend(self.toolchain.clone());
        if let Some(file) = &self.toolchain_file {
            env.insert(
                "CMAKE_TOOLCHAIN_FILE".to_string(),
                file.display().to_string(),
            );
        }

        for (key, value) in &self.extra_env {
            env.insert(key.clone(), value.clone());
        }

        env
    }

    /// Check if all required environment variables are set
    pub fn validate(&self) -> Result<(), BuildEnvError> {
        if self.srcdir.as_os_str().is_empty() {
            return Err(BuildEnvError::MissingVariable("SRCDIR".to_string()));
        }
        if self.builddir.as_os_str().is_empty() {
            return Err(BuildEnvError::MissingVariable("BUILDDIR".to_string()));
        }
        if self.jobs == 0 {
            return Err(BuildEnvError::InvalidValue {
                variable: "JOBS".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Upper-case a dependency name into an environment variable fragment
fn env_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Build environment errors
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEnvError {
    /// Required variable is missing
    MissingVariable(String),
    /// Variable has invalid value
    InvalidValue { variable: String, reason: String },
}

impl std::fmt::Display for BuildEnvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingVariable(var) => write!(f, "Missing required environment variable: {var}"),
            Self::InvalidValue { variable, reason } => {
                write!(f, "Invalid value for {variable}: {reason}")
            }
        }
    }
}

impl std::error::Error for BuildEnvError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::arch::Arch;
    use crate::core::context::{Dependency, Folders, SharedState};
    use crate::core::recipe::NoopRecipe;
    use crate::core::settings::{Options, Settings};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn context() -> BuildContext {
        let settings: Settings = [("os", "iOS"), ("arch", "armv8"), ("os.fat_arch", "armv7;armv8")]
            .into_iter()
            .collect();
        let mut shared = SharedState {
            name: "foo".to_string(),
            ..SharedState::default()
        };
        shared.dependencies.insert(
            "zlib-ng".to_string(),
            Dependency {
                root: PathBuf::from("/deps/zlib"),
                ..Dependency::default()
            },
        );
        BuildContext::new(
            shared,
            settings,
            Options::new(),
            Folders::new("/src".into(), "/build".into(), "/pkg".into()),
            Arc::new(NoopRecipe),
        )
    }

    #[test]
    fn test_environment_from_context() {
        let env = BuildEnvironment::for_context(&context()).with_jobs(4);
        let map = env.to_env_map();

        assert_eq!(map["SRCDIR"], "/src");
        assert_eq!(map["BUILDDIR"], "/build");
        assert_eq!(map["DESTDIR"], "/pkg");
        assert_eq!(map["ARCH"], "armv8");
        assert_eq!(map["OS"], "iOS");
        assert_eq!(map["JOBS"], "4");
        assert_eq!(map["DEP_ZLIB_NG_ROOT"], "/deps/zlib");
    }

    #[test]
    fn test_per_arch_clone_environment() {
        let clone = context().for_arch(&Arch::new("armv7"));
        let map = BuildEnvironment::for_context(&clone).to_env_map();

        assert_eq!(map["ARCH"], "armv7");
        assert_eq!(map["BUILDDIR"], "/build/conan_archs/armv7");
        assert_eq!(map["DESTDIR"], "/pkg/conan_archs/armv7");
        assert_eq!(map["SRCDIR"], "/src");
    }

    #[test]
    fn test_toolchain_variables() {
        let ctx = context().for_arch(&Arch::new("armv7"));
        let toolchain = ToolchainConfig::from_settings(&ctx.settings, None)
            .unwrap()
            .unwrap();
        let map = BuildEnvironment::for_context(&ctx)
            .with_toolchain(&toolchain, PathBuf::from("/build/tc.cmake"))
            .to_env_map();

        assert_eq!(map["CMAKE_OSX_ARCHITECTURES"], "armv7");
        assert_eq!(map["CMAKE_SYSTEM_NAME"], "iOS");
        assert_eq!(map["CMAKE_TOOLCHAIN_FILE"], "/build/tc.cmake");
    }

    #[test]
    fn test_validation_fails_for_zero_jobs() {
        let env = BuildEnvironment::for_context(&context()).with_jobs(0);
        assert!(matches!(
            env.validate(),
            Err(BuildEnvError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_validation_passes_for_context() {
        assert!(BuildEnvironment::for_context(&context()).validate().is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_extra_env_preserved(key in "[A-Z_]{1,10}", value in "[a-zA-Z0-9_]{1,20}") {
            prop_assume!(!["SRCDIR", "BUILDDIR", "DESTDIR", "JOBS", "ARCH", "OS"].contains(&key.as_str()));
            let env = BuildEnvironment::for_context(&context()).with_env(&key, &value);
            let map = env.to_env_map();
            prop_assert_eq!(map.get(&key), Some(&value));
        }

        #[test]
        fn prop_dependency_names_become_env_names(name in "[a-z][a-z0-9._-]{0,12}") {
            let fragment = env_name(&name);
            prop_assert!(fragment.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'));
            prop_assert_eq!(fragment.len(), name.len());
        }
    }
}
