//! Multi-arch eligibility gate
//!
//! Decides once per context whether multi-arch orchestration engages, and
//! which flavour: full per-architecture replay, or only a package-time filter
//! for recipes whose generator already builds every architecture at once.

use crate::config::defaults::{
    ARCH_DELIMITER, HEADER_ONLY_OPTION, MULTI_ARCH_GENERATORS_SETTING, MULTI_ARCH_OPTION,
    XCODE_CMAKE_GENERATOR,
};
use crate::core::arch::{self, Arch, ArchSet};
use crate::core::context::BuildContext;
use crate::core::global_config::GateConfig;
use crate::core::toolchain::is_apple_os;

/// Orchestration installed on a context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Orchestration {
    /// Replay every step once per architecture and merge the packages
    MultiArch(Vec<Arch>),
    /// Run steps once, keeping the listed patterns out of the package
    PackageFilterOnly(Vec<String>),
}

/// Why the gate left a context alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclineReason {
    /// Target OS cannot carry fat binaries
    UnsupportedOs(Option<String>),
    /// Nothing is compiled
    HeaderOnly,
    /// The recipe has no architecture setting
    NoArchAxis,
    /// Fewer than two architectures requested
    SingleArch,
    /// The `multi_arch` option says the recipe handles it
    NativeOption,
    /// The recipe orchestrates architectures itself
    NativeRecipe,
}

impl std::fmt::Display for DeclineReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedOs(Some(os)) => write!(f, "OS '{os}' does not support fat binaries"),
            Self::UnsupportedOs(None) => write!(f, "no OS setting"),
            Self::HeaderOnly => write!(f, "header-only package"),
            Self::NoArchAxis => write!(f, "no arch setting"),
            Self::SingleArch => write!(f, "single architecture"),
            Self::NativeOption => write!(f, "multi_arch option declares native support"),
            Self::NativeRecipe => write!(f, "recipe handles multiple architectures itself"),
        }
    }
}

/// Outcome of applying the gate to a context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Orchestration was installed now
    Installed(Orchestration),
    /// Orchestration was installed by an earlier call
    AlreadyInstalled,
    /// The context runs as a plain single-architecture build
    Declined(DeclineReason),
}

/// Generators counted as natively multi-arch for this context
///
/// A `multi_arch_generators` setting overrides the configured list. Otherwise
/// `cmake` only counts when the CMake generator is Xcode.
pub fn multi_arch_generators(ctx: &BuildContext, config: &GateConfig) -> Vec<String> {
    if let Some(value) = ctx.settings.get(MULTI_ARCH_GENERATORS_SETTING) {
        return value
            .split(ARCH_DELIMITER)
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect();
    }
    let xcode = ctx.shared().cmake_generator.as_deref() == Some(XCODE_CMAKE_GENERATOR);
    config
        .multi_arch_generators
        .iter()
        .filter(|g| xcode || g.as_str() != "cmake")
        .cloned()
        .collect()
}

fn is_supported_os(os: &str, config: &GateConfig) -> bool {
    is_apple_os(os) || config.extra_os.iter().any(|extra| extra == os)
}

/// Decide what orchestration `ctx` needs, without touching it
pub fn evaluate(ctx: &BuildContext, config: &GateConfig) -> Result<Orchestration, DeclineReason> {
    match ctx.settings.os() {
        Some(os) if is_supported_os(os, config) => {}
        other => return Err(DeclineReason::UnsupportedOs(other.map(str::to_string))),
    }
    if ctx.options.get_bool(HEADER_ONLY_OPTION) == Some(true) {
        return Err(DeclineReason::HeaderOnly);
    }
    if ctx.settings.arch().is_none() {
        return Err(DeclineReason::NoArchAxis);
    }
    let ArchSet::Multi(archs) = arch::resolve(&ctx.settings) else {
        return Err(DeclineReason::SingleArch);
    };

    match ctx.options.get_bool(MULTI_ARCH_OPTION) {
        Some(true) => return Err(DeclineReason::NativeOption),
        Some(false) => return Ok(Orchestration::MultiArch(archs)),
        None => {}
    }

    let generators = multi_arch_generators(ctx, config);
    if let Some(generator) = ctx
        .shared()
        .generators
        .iter()
        .find(|g| generators.contains(*g))
    {
        tracing::debug!("Generator '{generator}' builds all architectures natively");
        return Ok(Orchestration::PackageFilterOnly(config.package_filter.clone()));
    }

    if ctx.recipe().handles_multi_arch() {
        return Err(DeclineReason::NativeRecipe);
    }

    Ok(Orchestration::MultiArch(archs))
}

/// Install orchestration on `ctx` if it is eligible and not yet patched
pub fn apply(ctx: &mut BuildContext, config: &GateConfig) -> GateDecision {
    if ctx.is_patched() {
        return GateDecision::AlreadyInstalled;
    }
    match evaluate(ctx, config) {
        Ok(orchestration) => {
            match &orchestration {
                Orchestration::MultiArch(archs) => {
                    let names: Vec<&str> = archs.iter().map(Arch::as_str).collect();
                    ctx.output()
                        .info(format!("Enable multi build for {}", names.join(", ")));
                }
                Orchestration::PackageFilterOnly(_) => {
                    ctx.output().info("Enable package filter for native multi-arch build");
                }
            }
            ctx.install(orchestration.clone());
            GateDecision::Installed(orchestration)
        }
        Err(reason) => {
            ctx.output().debug(format!("Multi build not enabled: {reason}"));
            GateDecision::Declined(reason)
        }
    }
}
