//! Integration tests for step orchestration
//!
//! Uses an in-process recipe that records every invocation to check:
//! - one invocation per architecture, in resolution order, in distinct folders
//! - per-architecture settings never leak into the parent context
//! - the gate installs orchestration at most once
//! - native multi-arch generators only get the package filter

mod common;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use common::TestProject;
use fatbuild::core::arch::Arch;
use fatbuild::core::context::{BuildContext, Folders, SharedState};
use fatbuild::core::gate::{DeclineReason, GateDecision, Orchestration};
use fatbuild::core::hooks::Orchestrator;
use fatbuild::core::recipe::Recipe;
use fatbuild::core::runner::StepKind;
use fatbuild::core::settings::{OptionValue, Options, Settings};
use fatbuild::error::OrchestratorError;
use proptest::prelude::*;

/// One recorded recipe call
#[derive(Debug, Clone, PartialEq, Eq)]
struct Call {
    step: StepKind,
    arch: Option<String>,
    fat_arch: Option<String>,
    build: PathBuf,
    scope: String,
}

#[derive(Default)]
struct RecordingRecipe {
    calls: Mutex<Vec<Call>>,
    fail_on: Option<String>,
    native: bool,
}

impl RecordingRecipe {
    fn record(&self, step: StepKind, ctx: &BuildContext) -> anyhow::Result<()> {
        let arch = ctx.settings.arch().map(str::to_string);
        self.calls.lock().unwrap().push(Call {
            step,
            arch: arch.clone(),
            fat_arch: ctx.settings.get("os.fat_arch").map(str::to_string),
            build: ctx.folders.build.clone(),
            scope: ctx.display_name().to_string(),
        });
        if arch.is_some() && arch == self.fail_on {
            anyhow::bail!("compiler exploded");
        }
        Ok(())
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl Recipe for RecordingRecipe {
    fn build(&self, ctx: &BuildContext) -> anyhow::Result<()> {
        std::fs::create_dir_all(&ctx.folders.build)?;
        self.record(StepKind::Build, ctx)
    }

    fn package(&self, ctx: &BuildContext) -> anyhow::Result<()> {
        self.record(StepKind::Package, ctx)?;
        // Object files next to the library to exercise the package filter
        std::fs::create_dir_all(ctx.folders.build.join("lib"))?;
        std::fs::write(ctx.folders.build.join("lib/foo.o"), "obj")?;
        std::fs::write(ctx.folders.build.join("lib/foo.txt"), "doc")?;
        ctx.copier().copy("*", "lib", "share", true)?;
        Ok(())
    }

    fn test(&self, ctx: &BuildContext) -> anyhow::Result<()> {
        self.record(StepKind::Test, ctx)
    }

    fn handles_multi_arch(&self) -> bool {
        self.native
    }
}

fn context(root: &Path, settings: Settings, recipe: Arc<RecordingRecipe>) -> BuildContext {
    BuildContext::new(
        SharedState {
            name: "foo".to_string(),
            ..SharedState::default()
        },
        settings,
        Options::new(),
        Folders::new(root.join("src"), root.join("build"), root.join("package")),
        recipe,
    )
}

fn ios(fat_arch: &str) -> Settings {
    [("os", "iOS"), ("arch", "armv8"), ("os.fat_arch", fat_arch)]
        .into_iter()
        .collect()
}

#[test]
fn test_build_runs_once_per_arch_in_order() {
    let project = TestProject::new();
    let recipe = Arc::new(RecordingRecipe::default());
    let mut ctx = context(&project.path(), ios("armv7;armv7s;armv8"), Arc::clone(&recipe));

    let report = Orchestrator::default().build(&mut ctx).unwrap();

    let calls = recipe.calls();
    let archs: Vec<_> = calls.iter().map(|c| c.arch.clone().unwrap()).collect();
    assert_eq!(archs, vec!["armv7", "armv7s", "armv8"]);
    assert_eq!(report.archs.len(), 3);

    let mut dirs: Vec<_> = calls.iter().map(|c| c.build.clone()).collect();
    dirs.dedup();
    assert_eq!(dirs.len(), 3);
    for call in &calls {
        let arch = call.arch.as_deref().unwrap();
        assert_eq!(call.build, project.path().join("build/conan_archs").join(arch));
        assert_eq!(call.scope, format!("foo[{arch}]"));
        assert_eq!(call.fat_arch, None);
    }

    // Parent context untouched
    assert_eq!(ctx.settings.arch(), Some("armv8"));
    assert_eq!(ctx.settings.get("os.fat_arch"), Some("armv7;armv7s;armv8"));
    assert_eq!(ctx.folders.build, project.path().join("build"));
}

#[test]
fn test_failure_names_the_arch() {
    let project = TestProject::new();
    let recipe = Arc::new(RecordingRecipe {
        fail_on: Some("armv7s".to_string()),
        ..RecordingRecipe::default()
    });
    let mut ctx = context(&project.path(), ios("armv7;armv7s;armv8"), Arc::clone(&recipe));

    let err = Orchestrator::default().build(&mut ctx).unwrap_err();

    match &err {
        OrchestratorError::StepFailed { step, scope, error } => {
            assert_eq!(*step, StepKind::Build);
            assert_eq!(scope, "foo[armv7s]");
            assert!(error.contains("compiler exploded"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("foo[armv7s]"));
    // armv8 never attempted
    assert_eq!(recipe.calls().len(), 2);
}

#[test]
fn test_gate_is_idempotent() {
    let project = TestProject::new();
    let recipe = Arc::new(RecordingRecipe::default());
    let mut ctx = context(&project.path(), ios("armv7;armv8"), recipe);
    let orchestrator = Orchestrator::default();

    let first = orchestrator.pre_build(&mut ctx);
    let installed = ctx.orchestration().cloned();
    let second = orchestrator.pre_package(&mut ctx, Path::new("recipe.toml"));
    let third = orchestrator.pre_build(&mut ctx);

    assert_eq!(
        first,
        GateDecision::Installed(Orchestration::MultiArch(vec![
            Arch::new("armv7"),
            Arch::new("armv8")
        ]))
    );
    assert_eq!(second, GateDecision::AlreadyInstalled);
    assert_eq!(third, GateDecision::AlreadyInstalled);
    assert_eq!(ctx.orchestration().cloned(), installed);
}

#[test]
fn test_single_arch_list_passes_through() {
    let project = TestProject::new();
    let recipe = Arc::new(RecordingRecipe::default());
    let mut ctx = context(&project.path(), ios("armv8;armv8"), Arc::clone(&recipe));

    Orchestrator::default().build(&mut ctx).unwrap();

    assert!(!ctx.is_patched());
    let calls = recipe.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].build, project.path().join("build"));
}

#[test]
fn test_native_recipe_declines() {
    let project = TestProject::new();
    let recipe = Arc::new(RecordingRecipe {
        native: true,
        ..RecordingRecipe::default()
    });
    let mut ctx = context(&project.path(), ios("armv7;armv8"), recipe);

    assert_eq!(
        Orchestrator::default().pre_build(&mut ctx),
        GateDecision::Declined(DeclineReason::NativeRecipe)
    );
}

#[test]
fn test_multi_arch_option_overrides_native_generator() {
    let project = TestProject::new();
    let recipe = Arc::new(RecordingRecipe::default());
    let mut ctx = BuildContext::new(
        SharedState {
            name: "foo".to_string(),
            generators: vec!["cmake".to_string()],
            cmake_generator: Some("Xcode".to_string()),
            ..SharedState::default()
        },
        ios("armv7;armv8"),
        Options::new(),
        Folders::new(
            project.path().join("src"),
            project.path().join("build"),
            project.path().join("package"),
        ),
        recipe,
    );
    ctx.options.set("multi_arch", OptionValue::Bool(false));

    assert!(matches!(
        Orchestrator::default().pre_build(&mut ctx),
        GateDecision::Installed(Orchestration::MultiArch(_))
    ));
}

#[test]
fn test_native_generator_only_filters_package() {
    let project = TestProject::new();
    let recipe = Arc::new(RecordingRecipe::default());
    let mut ctx = BuildContext::new(
        SharedState {
            name: "foo".to_string(),
            generators: vec!["cmake".to_string()],
            cmake_generator: Some("Xcode".to_string()),
            ..SharedState::default()
        },
        ios("armv7;armv8"),
        Options::new(),
        Folders::new(
            project.path().join("src"),
            project.path().join("build"),
            project.path().join("package"),
        ),
        Arc::clone(&recipe) as Arc<dyn Recipe>,
    );
    let orchestrator = Orchestrator::default();

    orchestrator.build(&mut ctx).unwrap();
    orchestrator
        .package(&mut ctx, Path::new("recipe.toml"))
        .unwrap();

    assert!(matches!(
        ctx.orchestration(),
        Some(Orchestration::PackageFilterOnly(_))
    ));
    // Steps ran once on the context itself
    let calls = recipe.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.scope == "foo"));

    assert!(project.file_exists("package/share/foo.txt"));
    assert!(!project.file_exists("package/share/foo.o"));
    assert!(!project.file_exists("build/conan_archs"));
}

#[test]
fn test_ninja_cmake_is_orchestrated() {
    let project = TestProject::new();
    let recipe = Arc::new(RecordingRecipe::default());
    let mut ctx = BuildContext::new(
        SharedState {
            name: "foo".to_string(),
            generators: vec!["cmake".to_string()],
            cmake_generator: Some("Ninja".to_string()),
            ..SharedState::default()
        },
        ios("armv7;armv8"),
        Options::new(),
        Folders::new(
            project.path().join("src"),
            project.path().join("build"),
            project.path().join("package"),
        ),
        recipe,
    );

    assert!(matches!(
        Orchestrator::default().pre_build(&mut ctx),
        GateDecision::Installed(Orchestration::MultiArch(_))
    ));
}

#[test]
fn test_test_step_needs_build_scratch() {
    let project = TestProject::new();
    let recipe = Arc::new(RecordingRecipe::default());
    let mut ctx = context(&project.path(), ios("armv7;armv8"), Arc::clone(&recipe));

    let err = Orchestrator::default().test(&mut ctx).unwrap_err();

    assert!(matches!(err, OrchestratorError::MissingBuildScratch { .. }));
    assert!(recipe.calls().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn prop_one_build_per_distinct_arch(
        archs in prop::collection::vec(
            prop_oneof![Just("armv7"), Just("armv7s"), Just("armv8"), Just("x86_64")],
            2..6,
        )
    ) {
        let project = TestProject::new();
        let recipe = Arc::new(RecordingRecipe::default());
        let mut ctx = context(&project.path(), ios(&archs.join(";")), Arc::clone(&recipe));

        Orchestrator::default().build(&mut ctx).unwrap();

        let mut distinct: Vec<&str> = Vec::new();
        for arch in &archs {
            if !distinct.contains(arch) {
                distinct.push(*arch);
            }
        }
        let calls = recipe.calls();
        if distinct.len() < 2 {
            prop_assert_eq!(calls.len(), 1);
        } else {
            let seen: Vec<String> = calls.iter().filter_map(|c| c.arch.clone()).collect();
            prop_assert_eq!(seen, distinct.iter().map(|s| s.to_string()).collect::<Vec<_>>());
        }
    }
}
