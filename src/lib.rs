//! Fatbuild - multi-architecture fat package orchestration
//!
//! Makes a recipe that targets one architecture per invocation produce a
//! universal (fat) package when several architectures are requested at once.
//! Each step is replayed per architecture in isolated scratch trees and the
//! packages are merged, combining Mach-O binaries with `lipo`.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Orchestration logic
//! - [`infra`] - Infrastructure layer (filesystem, processes)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
