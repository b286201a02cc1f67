//! Core orchestration logic
//!
//! Decides when a recipe needs per-architecture isolation, drives its steps
//! once per architecture and reassembles the outputs into a fat package.
//! Side effects go through [`crate::infra`].
//!
//! # Submodules
//!
//! - [`classify`] - Binary vs plain file classification
//! - [`merge`] - Non-clobbering directory tree merge
//! - [`arch`] - Architecture set resolution
//! - [`gate`] - Multi-arch eligibility gate
//! - [`context`] - Build context and per-architecture cloning
//! - [`runner`] - Per-architecture step driver
//! - [`fat_merge`] - Fat package reassembly
//! - [`package_filter`] - Wildcard filters for package copies
//! - [`hooks`] - Host hook points
//! - [`recipe`] - Recipe trait and recipe.toml
//! - [`toolchain`] - Apple CMake toolchain configuration
//! - [`build_env`] - Step environment variables
//! - [`settings`] - Settings and options
//! - [`global_config`] - Global configuration management

pub mod arch;
pub mod build_env;
pub mod classify;
pub mod context;
pub mod fat_merge;
pub mod gate;
pub mod global_config;
pub mod hooks;
pub mod merge;
pub mod package_filter;
pub mod recipe;
pub mod runner;
pub mod settings;
pub mod toolchain;
