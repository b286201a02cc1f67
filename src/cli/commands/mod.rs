//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod archs;
pub mod classify;
pub mod merge;
pub mod step;
pub mod toolchain;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::config::defaults::DEFAULT_RECIPE_FILE;
use crate::core::context::BuildContext;
use crate::core::global_config::GlobalConfig;
use crate::core::recipe::{self, RecipeManifest};
use crate::infra::dirs::FatbuildDirs;

/// Flags shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Explicit global configuration file
    pub config: Option<PathBuf>,
    /// Machine-readable output
    pub json: bool,
    /// Suppress non-error output
    pub quiet: bool,
}

impl GlobalArgs {
    /// Load the global configuration
    pub fn load_config(&self) -> Result<GlobalConfig> {
        let config = match &self.config {
            Some(path) => GlobalConfig::load_from_path(path),
            None => GlobalConfig::load(&FatbuildDirs::new()),
        };
        config.context("Failed to load global configuration")
    }
}

/// Which recipe to load and where its folders live
#[derive(Args, Debug, Clone)]
pub struct RecipeArgs {
    /// Path to the recipe manifest
    #[arg(short, long, default_value = DEFAULT_RECIPE_FILE)]
    pub recipe: PathBuf,

    /// Source folder (defaults to the recipe's folder)
    #[arg(long)]
    pub source_folder: Option<PathBuf>,

    /// Build folder (defaults to build/ next to the recipe)
    #[arg(long)]
    pub build_folder: Option<PathBuf>,

    /// Package folder (defaults to package/ next to the recipe)
    #[arg(long)]
    pub package_folder: Option<PathBuf>,

    /// Override a setting (e.g. -s "os.fat_arch=armv7;armv8")
    #[arg(short, long = "setting", value_name = "KEY=VALUE")]
    pub settings: Vec<String>,

    /// Override an option (e.g. -o multi_arch=False)
    #[arg(short, long = "option", value_name = "KEY=VALUE")]
    pub options: Vec<String>,
}

impl RecipeArgs {
    /// Load the recipe and build its context
    pub fn load_context(&self) -> Result<BuildContext> {
        let manifest = RecipeManifest::load(&self.recipe)?;
        let mut folders = recipe::default_folders(
            &self.recipe,
            self.build_folder.clone(),
            self.package_folder.clone(),
        );
        if let Some(source) = &self.source_folder {
            folders.source.clone_from(source);
        }
        let mut ctx = manifest.into_context(folders);

        for assignment in &self.settings {
            ctx.settings
                .apply_override(assignment)
                .map_err(anyhow::Error::msg)
                .context("Invalid --setting")?;
        }
        for assignment in &self.options {
            ctx.options
                .apply_override(assignment)
                .map_err(anyhow::Error::msg)
                .context("Invalid --option")?;
        }
        Ok(ctx)
    }

    /// Recipe path as given
    pub fn recipe_path(&self) -> &Path {
        &self.recipe
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the recipe (once per architecture for fat builds)
    Build(RecipeArgs),

    /// Package the recipe, merging architectures into a fat package
    Package(RecipeArgs),

    /// Run the recipe's tests (once per architecture for fat builds)
    Test(RecipeArgs),

    /// Build, package and test in one go
    Create(RecipeArgs),

    /// Show the resolved architectures and the gate decision
    Archs(RecipeArgs),

    /// Classify files as combinable binaries or plain files
    Classify {
        /// Files to classify
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Merge a directory tree into another without overwriting
    Merge {
        /// Source tree
        src: PathBuf,

        /// Destination tree
        dst: PathBuf,
    },

    /// Write the CMake toolchain file for the recipe's settings
    Toolchain {
        #[command(flatten)]
        recipe: RecipeArgs,

        /// Output directory (defaults to the build folder)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    /// Execute the command
    pub async fn run(self, globals: &GlobalArgs) -> Result<()> {
        match self {
            Self::Build(args) => step::execute(step::StepCommand::Build, &args, globals).await,
            Self::Package(args) => step::execute(step::StepCommand::Package, &args, globals).await,
            Self::Test(args) => step::execute(step::StepCommand::Test, &args, globals).await,
            Self::Create(args) => step::execute(step::StepCommand::Create, &args, globals).await,
            Self::Archs(args) => archs::execute(&args, globals).await,
            Self::Classify { files } => classify::execute(&files, globals).await,
            Self::Merge { src, dst } => merge::execute(&src, &dst, globals).await,
            Self::Toolchain { recipe, output } => {
                toolchain::execute(&recipe, output.as_deref(), globals).await
            }
        }
    }
}
