//! Infrastructure layer
//!
//! Handles all I/O operations: filesystem and external processes.
//! This module is the only place where side effects occur.

pub mod combine;
pub mod copier;
pub mod dirs;
pub mod filesystem;
pub mod process;
pub mod xcrun;
