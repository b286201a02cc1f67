//! Per-architecture step driver
//!
//! [`StepRunner`] is the strategy chosen for a step from the orchestration the
//! gate installed on a context. Pass-through runs the recipe's step on the
//! context itself; the multi-arch variants clone the context once per
//! architecture, run the recipe's step on each clone in resolution order, and
//! (for packaging) reassemble the fat package afterwards.

use crate::config::defaults::ARCH_FOLDER;
use crate::core::arch::Arch;
use crate::core::context::BuildContext;
use crate::core::fat_merge::{self, FatMergeReport};
use crate::core::gate::Orchestration;
use crate::core::global_config::MergeConfig;
use crate::core::package_filter;
use crate::error::{FilesystemError, OrchestratorError};
use crate::infra::filesystem;

/// Lifecycle step of a recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// Compile
    Build,
    /// Stage the package
    Package,
    /// Run tests
    Test,
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Build => write!(f, "build"),
            Self::Package => write!(f, "package"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// Strategy used to run one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepRunner {
    /// Run the recipe's step on the context unchanged
    PassThrough,
    /// Build once per architecture in isolated build trees
    MultiArchBuild(Vec<Arch>),
    /// Package once per architecture, then merge into a fat package
    MultiArchPackage(Vec<Arch>),
    /// Test once per architecture against its build tree
    MultiArchTest(Vec<Arch>),
    /// Package once, keeping the listed patterns out of the package
    PackageFilterOnly(Vec<String>),
}

/// What a step run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Step that ran
    pub step: StepKind,
    /// Architectures the step ran for; empty for single-context runs
    pub archs: Vec<Arch>,
    /// Fat merge outcome, for multi-arch packaging
    pub merge: Option<FatMergeReport>,
}

impl StepReport {
    fn single(step: StepKind) -> Self {
        Self {
            step,
            archs: Vec::new(),
            merge: None,
        }
    }
}

impl StepRunner {
    /// Strategy for `step` given the context's orchestration
    pub fn select(orchestration: Option<&Orchestration>, step: StepKind) -> Self {
        match (orchestration, step) {
            (Some(Orchestration::MultiArch(archs)), _) if archs.len() < 2 => Self::PassThrough,
            (Some(Orchestration::MultiArch(archs)), StepKind::Build) => {
                Self::MultiArchBuild(archs.clone())
            }
            (Some(Orchestration::MultiArch(archs)), StepKind::Package) => {
                Self::MultiArchPackage(archs.clone())
            }
            (Some(Orchestration::MultiArch(archs)), StepKind::Test) => {
                Self::MultiArchTest(archs.clone())
            }
            (Some(Orchestration::PackageFilterOnly(patterns)), StepKind::Package) => {
                Self::PackageFilterOnly(patterns.clone())
            }
            _ => Self::PassThrough,
        }
    }

    /// Run the step against `ctx`
    ///
    /// The first failing architecture aborts the step; remaining
    /// architectures are not attempted.
    pub fn run(
        &self,
        ctx: &BuildContext,
        step: StepKind,
        config: &MergeConfig,
    ) -> Result<StepReport, OrchestratorError> {
        match self {
            Self::PassThrough => {
                run_original(ctx, step)?;
                Ok(StepReport::single(step))
            }
            Self::MultiArchBuild(archs) => build_each(ctx, archs),
            Self::MultiArchPackage(archs) => package_each(ctx, archs, config),
            Self::MultiArchTest(archs) => test_each(ctx, archs),
            Self::PackageFilterOnly(patterns) => {
                let filtered = package_filter::filtered_context(ctx, patterns);
                run_original(&filtered, StepKind::Package)?;
                Ok(StepReport::single(StepKind::Package))
            }
        }
    }
}

/// Call the recipe's own implementation of `step` on `ctx`
fn run_original(ctx: &BuildContext, step: StepKind) -> Result<(), OrchestratorError> {
    let recipe = ctx.recipe();
    let result = match step {
        StepKind::Build => recipe.build(ctx),
        StepKind::Package => recipe.package(ctx),
        StepKind::Test => recipe.test(ctx),
    };
    result.map_err(|e| OrchestratorError::StepFailed {
        step,
        scope: ctx.display_name().to_string(),
        error: format!("{e:#}"),
    })
}

fn log_arch(clone: &BuildContext, verb: &str, arch: &Arch) {
    clone.output().info(format!("{verb} arch: {arch}"));
    clone.output().info(format!("settings: {}", clone.settings));
}

fn build_each(ctx: &BuildContext, archs: &[Arch]) -> Result<StepReport, OrchestratorError> {
    let stage_err = |scope: &str, source: FilesystemError| OrchestratorError::Stage {
        scope: scope.to_string(),
        source,
    };
    let build_root = &ctx.folders.build;
    filesystem::create_dir_all(build_root).map_err(|e| stage_err(ctx.display_name(), e))?;
    let scratch_root = build_root.join(ARCH_FOLDER);

    for arch in archs {
        let clone = ctx.for_arch(arch);

        // Fresh copy of the shared build tree, without other archs' scratch
        filesystem::remove_dir_all(&clone.folders.build)
            .map_err(|e| stage_err(clone.display_name(), e))?;
        filesystem::copy_tree_filtered(build_root, &clone.folders.build, |p| p == scratch_root.as_path())
            .map_err(|e| stage_err(clone.display_name(), e))?;

        log_arch(&clone, "building", arch);
        run_original(&clone, StepKind::Build)?;
    }

    Ok(StepReport {
        step: StepKind::Build,
        archs: archs.to_vec(),
        merge: None,
    })
}

fn require_build_scratch(clone: &BuildContext) -> Result<(), OrchestratorError> {
    if clone.folders.build.is_dir() {
        Ok(())
    } else {
        Err(OrchestratorError::MissingBuildScratch {
            scope: clone.display_name().to_string(),
            path: clone.folders.build.clone(),
        })
    }
}

fn package_each(
    ctx: &BuildContext,
    archs: &[Arch],
    config: &MergeConfig,
) -> Result<StepReport, OrchestratorError> {
    for arch in archs {
        let clone = ctx.for_arch(arch);
        require_build_scratch(&clone)?;

        // Leftovers of an interrupted run must not leak into the merge
        let stage = |e: FilesystemError| OrchestratorError::Stage {
            scope: clone.display_name().to_string(),
            source: e,
        };
        filesystem::remove_dir_all(&clone.folders.package).map_err(stage)?;
        filesystem::create_dir_all(&clone.folders.package).map_err(stage)?;

        log_arch(&clone, "packaging", arch);
        run_original(&clone, StepKind::Package)?;
    }

    let merge = fat_merge::merge_package(&ctx.folders.package, archs, config, ctx.output())
        .map_err(|source| OrchestratorError::Merge {
            scope: ctx.display_name().to_string(),
            source,
        })?;
    fat_merge::discard_scratch(&ctx.folders.package)?;

    ctx.output().info(format!(
        "Fat package ready: {} combined, {} merged",
        merge.combined.len(),
        merge.stats.copied + merge.stats.delegated
    ));

    Ok(StepReport {
        step: StepKind::Package,
        archs: archs.to_vec(),
        merge: Some(merge),
    })
}

fn test_each(ctx: &BuildContext, archs: &[Arch]) -> Result<StepReport, OrchestratorError> {
    for arch in archs {
        let clone = ctx.for_arch(arch);
        require_build_scratch(&clone)?;
        log_arch(&clone, "testing", arch);
        run_original(&clone, StepKind::Test)?;
    }

    Ok(StepReport {
        step: StepKind::Test,
        archs: archs.to_vec(),
        merge: None,
    })
}
