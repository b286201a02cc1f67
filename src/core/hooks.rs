//! Host hook points
//!
//! The host lifecycle calls [`Orchestrator::pre_build`] right before the build
//! step and [`Orchestrator::pre_package`] right before the package step. Both
//! only run the eligibility gate; the steps themselves are then dispatched
//! through [`Orchestrator::run`], which picks the [`StepRunner`] matching the
//! orchestration installed on the context.

use std::path::Path;

use crate::core::context::BuildContext;
use crate::core::gate::{self, GateDecision};
use crate::core::global_config::GlobalConfig;
use crate::core::runner::{StepKind, StepReport, StepRunner};
use crate::error::OrchestratorError;

/// Entry point for a host driving recipe steps
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    config: GlobalConfig,
}

impl Orchestrator {
    /// Orchestrator using `config`
    pub fn new(config: GlobalConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Hook run before the build step
    pub fn pre_build(&self, ctx: &mut BuildContext) -> GateDecision {
        gate::apply(ctx, &self.config.gate)
    }

    /// Hook run before the package step
    pub fn pre_package(&self, ctx: &mut BuildContext, recipe_path: &Path) -> GateDecision {
        ctx.output()
            .debug(format!("pre_package for {}", recipe_path.display()));
        gate::apply(ctx, &self.config.gate)
    }

    /// Run `step` with the strategy selected for `ctx`
    pub fn run(&self, ctx: &BuildContext, step: StepKind) -> Result<StepReport, OrchestratorError> {
        let runner = StepRunner::select(ctx.orchestration(), step);
        tracing::debug!("{}: {step} via {runner:?}", ctx.display_name());
        runner.run(ctx, step, &self.config.merge)
    }

    /// Pre-build hook, then the build step
    pub fn build(&self, ctx: &mut BuildContext) -> Result<StepReport, OrchestratorError> {
        self.pre_build(ctx);
        self.run(ctx, StepKind::Build)
    }

    /// Pre-package hook, then the package step
    pub fn package(
        &self,
        ctx: &mut BuildContext,
        recipe_path: &Path,
    ) -> Result<StepReport, OrchestratorError> {
        self.pre_package(ctx, recipe_path);
        self.run(ctx, StepKind::Package)
    }

    /// The test step
    ///
    /// A context that went through no hook yet is gated first, so a
    /// standalone test run finds the per-architecture build trees.
    pub fn test(&self, ctx: &mut BuildContext) -> Result<StepReport, OrchestratorError> {
        self.pre_build(ctx);
        self.run(ctx, StepKind::Test)
    }

    /// Build, package and test in order, stopping at the first failure
    pub fn create(
        &self,
        ctx: &mut BuildContext,
        recipe_path: &Path,
    ) -> Result<Vec<StepReport>, OrchestratorError> {
        Ok(vec![
            self.build(ctx)?,
            self.package(ctx, recipe_path)?,
            self.test(ctx)?,
        ])
    }
}
