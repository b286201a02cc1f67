//! Recipes and the recipe manifest (recipe.toml)
//!
//! A [`Recipe`] supplies the single-architecture build, package and test
//! steps that orchestration wraps. [`CommandRecipe`] is the concrete recipe
//! used by the CLI: its steps are shell commands declared in `recipe.toml`,
//! run in the step's build folder with the step's build environment.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config::defaults::HEADER_ONLY_OPTION;
use crate::core::build_env::BuildEnvironment;
use crate::core::context::{BuildContext, Dependency, Folders, SharedState};
use crate::core::settings::{OptionValue, Options, Settings};
use crate::core::toolchain::{self, ToolchainConfig};
use crate::error::RecipeError;
use crate::infra::{filesystem, process, xcrun};

/// Single-architecture step implementations of a recipe
///
/// Steps act through the context's folders and report failure through
/// `anyhow`. They never see orchestration: per-architecture clones call them
/// directly.
pub trait Recipe: Send + Sync {
    /// Compile into `ctx.folders.build`
    fn build(&self, ctx: &BuildContext) -> anyhow::Result<()>;

    /// Stage the package into `ctx.folders.package`
    fn package(&self, ctx: &BuildContext) -> anyhow::Result<()>;

    /// Run the recipe's tests against the build tree
    fn test(&self, _ctx: &BuildContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Whether the recipe already builds and packages every architecture itself
    fn handles_multi_arch(&self) -> bool {
        false
    }
}

/// Recipe whose steps do nothing
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct NoopRecipe;

#[cfg(test)]
impl Recipe for NoopRecipe {
    fn build(&self, _ctx: &BuildContext) -> anyhow::Result<()> {
        Ok(())
    }

    fn package(&self, _ctx: &BuildContext) -> anyhow::Result<()> {
        Ok(())
    }
}

/// The recipe manifest (recipe.toml)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeManifest {
    /// Recipe identity and generator selection
    pub recipe: RecipeInfo,

    /// Build settings (`os`, `arch`, `os.fat_arch`, ...)
    #[serde(default)]
    pub settings: Settings,

    /// Recipe options
    #[serde(default)]
    pub options: Options,

    /// Resolved dependencies
    #[serde(default)]
    pub dependencies: BTreeMap<String, Dependency>,

    /// Step commands
    #[serde(default)]
    pub steps: StepCommands,

    /// Packaging rules
    #[serde(default)]
    pub package: PackageRules,
}

/// `[recipe]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecipeInfo {
    /// Recipe name
    pub name: String,

    /// Recipe version
    #[serde(default)]
    pub version: Option<String>,

    /// Generators the recipe uses
    #[serde(default)]
    pub generators: Vec<String>,

    /// CMake generator (e.g. `Xcode`, `Ninja`)
    #[serde(default)]
    pub cmake_generator: Option<String>,

    /// The recipe orchestrates multiple architectures itself
    #[serde(default)]
    pub native_multi_arch: bool,

    /// Nothing is compiled
    #[serde(default)]
    pub header_only: bool,
}

/// `[steps]` section: shell commands per step
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepCommands {
    /// Build commands
    #[serde(default)]
    pub build: Vec<String>,

    /// Package commands, run before the copy rules
    #[serde(default)]
    pub package: Vec<String>,

    /// Test commands
    #[serde(default)]
    pub test: Vec<String>,
}

/// `[package]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageRules {
    /// Copy rules applied with the context's file copier
    #[serde(default)]
    pub copy: Vec<CopyRule>,
}

/// One `[[package.copy]]` rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CopyRule {
    /// Wildcard pattern
    pub pattern: String,

    /// Folder below each source root to search
    #[serde(default)]
    pub src: String,

    /// Folder below the package root to copy into
    #[serde(default)]
    pub dst: String,

    /// Keep the path below `src`
    #[serde(default = "default_keep_path")]
    pub keep_path: bool,
}

fn default_keep_path() -> bool {
    true
}

impl RecipeManifest {
    /// Parse a manifest from TOML text
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, RecipeError> {
        let manifest: Self = toml::from_str(content).map_err(|e| RecipeError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load and validate a manifest file
    pub fn load(path: &Path) -> Result<Self, RecipeError> {
        if !path.exists() {
            return Err(RecipeError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = filesystem::read_file(path).map_err(|e| RecipeError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content, path)
    }

    /// Check the manifest for semantic errors
    pub fn validate(&self) -> Result<(), RecipeError> {
        let invalid = |message: String| Err(RecipeError::Invalid { message });

        if self.recipe.name.trim().is_empty() {
            return invalid("recipe name must not be empty".to_string());
        }
        for (step, commands) in [
            ("build", &self.steps.build),
            ("package", &self.steps.package),
            ("test", &self.steps.test),
        ] {
            if commands.iter().any(|c| c.trim().is_empty()) {
                return invalid(format!("empty command in steps.{step}"));
            }
        }
        for rule in &self.package.copy {
            if rule.pattern.trim().is_empty() {
                return invalid("package.copy rule with empty pattern".to_string());
            }
            if Path::new(&rule.dst).is_absolute() {
                return invalid(format!(
                    "package.copy destination '{}' must be relative",
                    rule.dst
                ));
            }
        }
        Ok(())
    }

    /// Display name: `name/version` or `name`
    pub fn reference(&self) -> String {
        match &self.recipe.version {
            Some(version) => format!("{}/{}", self.recipe.name, version),
            None => self.recipe.name.clone(),
        }
    }

    /// Build context for this manifest
    ///
    /// Relative dependency roots are resolved against `folders.source`.
    pub fn into_context(self, folders: Folders) -> BuildContext {
        let reference = self.reference();
        let mut options = self.options;
        if self.recipe.header_only && options.get(HEADER_ONLY_OPTION).is_none() {
            options.set(HEADER_ONLY_OPTION, OptionValue::Bool(true));
        }

        let dependencies = self
            .dependencies
            .into_iter()
            .map(|(name, mut dep)| {
                if dep.root.is_relative() {
                    dep.root = folders.source.join(&dep.root);
                }
                (name, dep)
            })
            .collect();

        let shared = SharedState {
            name: reference,
            version: self.recipe.version,
            generators: self.recipe.generators,
            cmake_generator: self.recipe.cmake_generator,
            dependencies,
        };
        let recipe = CommandRecipe {
            steps: self.steps,
            copy_rules: self.package.copy,
            native_multi_arch: self.recipe.native_multi_arch,
        };

        BuildContext::new(shared, self.settings, options, folders, Arc::new(recipe))
    }
}

/// Recipe driven by shell commands from the manifest
#[derive(Debug, Clone, Default)]
pub struct CommandRecipe {
    /// Step commands
    pub steps: StepCommands,
    /// Package copy rules
    pub copy_rules: Vec<CopyRule>,
    /// Declared native multi-arch support
    pub native_multi_arch: bool,
}

impl CommandRecipe {
    fn environment(ctx: &BuildContext) -> anyhow::Result<HashMap<String, String>> {
        let mut env = BuildEnvironment::for_context(ctx);

        let sysroot = match (ctx.settings.os(), ctx.settings.arch()) {
            (Some(os), Some(arch)) => {
                toolchain::apple_sdk_name(os, arch).and_then(xcrun::sdk_path)
            }
            _ => None,
        };
        if let Some(config) = ToolchainConfig::from_settings(&ctx.settings, sysroot)? {
            let file = config.write_to(&ctx.folders.build)?;
            env = env.with_toolchain(&config, file);
        }

        env.validate()?;
        Ok(env.to_env_map())
    }

    fn run_commands(ctx: &BuildContext, commands: &[String]) -> anyhow::Result<()> {
        if commands.is_empty() {
            return Ok(());
        }
        filesystem::create_dir_all(&ctx.folders.build)?;
        let env = Self::environment(ctx)?;
        for command in commands {
            ctx.output().debug(format!("$ {command}"));
            process::run_shell(command, &ctx.folders.build, &env)?;
        }
        Ok(())
    }
}

impl Recipe for CommandRecipe {
    fn build(&self, ctx: &BuildContext) -> anyhow::Result<()> {
        Self::run_commands(ctx, &self.steps.build)
    }

    fn package(&self, ctx: &BuildContext) -> anyhow::Result<()> {
        filesystem::create_dir_all(&ctx.folders.package)?;
        Self::run_commands(ctx, &self.steps.package)?;

        let copier = ctx.copier();
        for rule in &self.copy_rules {
            let written = copier
                .copy(&rule.pattern, &rule.src, &rule.dst, rule.keep_path)
                .with_context(|| format!("Copy rule '{}' failed", rule.pattern))?;
            ctx.output().debug(format!(
                "Packaged {} file(s) for '{}'",
                written.len(),
                rule.pattern
            ));
        }
        Ok(())
    }

    fn test(&self, ctx: &BuildContext) -> anyhow::Result<()> {
        Self::run_commands(ctx, &self.steps.test)
    }

    fn handles_multi_arch(&self) -> bool {
        self.native_multi_arch
    }
}

/// Default folders for a recipe at `recipe_path`
///
/// Sources live next to the recipe; build and package folders default to
/// `build/` and `package/` beside it.
pub fn default_folders(
    recipe_path: &Path,
    build: Option<PathBuf>,
    package: Option<PathBuf>,
) -> Folders {
    let root = recipe_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Folders::new(
        root.clone(),
        build.unwrap_or_else(|| root.join("build")),
        package.unwrap_or_else(|| root.join("package")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
[recipe]
name = "foo"
version = "1.0"
generators = ["cmake"]
cmake_generator = "Ninja"

[settings]
os = "iOS"
"os.version" = "12.0"
"os.fat_arch" = "armv7;armv8"
arch = "armv8"

[options]
shared = false

[dependencies.zlib]
root = "deps/zlib"
include_dirs = ["include"]

[steps]
build = ["echo $ARCH > built.txt"]
package = []

[[package.copy]]
pattern = "*.h"
src = "include"
dst = "include"

[[package.copy]]
pattern = "*.a"
dst = "lib"
keep_path = false
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = RecipeManifest::from_toml(MANIFEST, Path::new("recipe.toml")).unwrap();

        assert_eq!(manifest.reference(), "foo/1.0");
        assert_eq!(manifest.recipe.generators, vec!["cmake".to_string()]);
        assert_eq!(manifest.settings.get("os.fat_arch"), Some("armv7;armv8"));
        assert_eq!(manifest.options.get_bool("shared"), Some(false));
        assert_eq!(manifest.steps.build.len(), 1);
        assert_eq!(manifest.package.copy.len(), 2);
        assert!(manifest.package.copy[0].keep_path);
        assert!(!manifest.package.copy[1].keep_path);
    }

    #[test]
    fn test_missing_name_is_parse_error() {
        let err = RecipeManifest::from_toml("[recipe]\nversion = \"1\"\n", Path::new("r.toml"))
            .unwrap_err();
        assert!(matches!(err, RecipeError::Parse { .. }));
    }

    #[test]
    fn test_validation_rejects_empty_command() {
        let content = "[recipe]\nname = \"foo\"\n[steps]\nbuild = [\"  \"]\n";
        let err = RecipeManifest::from_toml(content, Path::new("r.toml")).unwrap_err();
        assert!(matches!(err, RecipeError::Invalid { .. }));
    }

    #[test]
    fn test_validation_rejects_absolute_copy_destination() {
        let content = "[recipe]\nname = \"foo\"\n[[package.copy]]\npattern = \"*\"\ndst = \"/etc\"\n";
        let err = RecipeManifest::from_toml(content, Path::new("r.toml")).unwrap_err();
        assert!(matches!(err, RecipeError::Invalid { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            RecipeManifest::load(&tmp.path().join("recipe.toml")),
            Err(RecipeError::NotFound { .. })
        ));
    }

    #[test]
    fn test_into_context() {
        let manifest = RecipeManifest::from_toml(MANIFEST, Path::new("recipe.toml")).unwrap();
        let ctx = manifest.into_context(Folders::new(
            "/work".into(),
            "/work/build".into(),
            "/work/package".into(),
        ));

        assert_eq!(ctx.display_name(), "foo/1.0");
        assert_eq!(ctx.shared().cmake_generator.as_deref(), Some("Ninja"));
        assert_eq!(
            ctx.shared().dependencies["zlib"].root,
            PathBuf::from("/work/deps/zlib")
        );
        assert!(!ctx.recipe().handles_multi_arch());
    }

    #[test]
    fn test_header_only_flag_sets_option() {
        let content = "[recipe]\nname = \"hdr\"\nheader_only = true\n";
        let ctx = RecipeManifest::from_toml(content, Path::new("r.toml"))
            .unwrap()
            .into_context(Folders::new("/s".into(), "/b".into(), "/p".into()));
        assert_eq!(ctx.options.get_bool("header_only"), Some(true));
    }

    #[test]
    fn test_default_folders() {
        let folders = default_folders(Path::new("/work/recipe.toml"), None, None);
        assert_eq!(folders.source, PathBuf::from("/work"));
        assert_eq!(folders.build, PathBuf::from("/work/build"));
        assert_eq!(folders.package, PathBuf::from("/work/package"));

        let folders = default_folders(Path::new("recipe.toml"), Some("/b".into()), None);
        assert_eq!(folders.source, PathBuf::from("."));
        assert_eq!(folders.build, PathBuf::from("/b"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_recipe_runs_in_build_folder() {
        let tmp = TempDir::new().unwrap();
        let content = r#"
[recipe]
name = "foo"

[settings]
os = "Linux"
arch = "x86_64"

[steps]
build = ["echo \"$ARCH\" > built.txt"]
package = ["mkdir -p \"$DESTDIR/share\" && cp built.txt \"$DESTDIR/share/\""]
"#;
        let ctx = RecipeManifest::from_toml(content, Path::new("r.toml"))
            .unwrap()
            .into_context(Folders::new(
                tmp.path().to_path_buf(),
                tmp.path().join("build"),
                tmp.path().join("pkg"),
            ));

        ctx.recipe().build(&ctx).unwrap();
        ctx.recipe().package(&ctx).unwrap();

        assert_eq!(
            std::fs::read_to_string(tmp.path().join("build/built.txt")).unwrap(),
            "x86_64\n"
        );
        assert!(tmp.path().join("pkg/share/built.txt").is_file());
        // Non-Apple targets get no toolchain file
        assert!(!tmp.path().join("build/fatbuild-toolchain.cmake").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_is_error() {
        let tmp = TempDir::new().unwrap();
        let content = "[recipe]\nname = \"foo\"\n[steps]\nbuild = [\"exit 1\"]\n";
        let ctx = RecipeManifest::from_toml(content, Path::new("r.toml"))
            .unwrap()
            .into_context(Folders::new(
                tmp.path().to_path_buf(),
                tmp.path().join("build"),
                tmp.path().join("pkg"),
            ));

        let err = ctx.recipe().build(&ctx).unwrap_err();
        assert!(err.downcast_ref::<RecipeError>().is_some());
    }
}
