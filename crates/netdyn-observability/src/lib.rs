// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # netdyn-observability
//!
//! Logging setup shared by netdyn binaries, with per-crate debug flag support.
//! Library crates only emit `tracing` events; installing a subscriber is left to
//! the binary that links them.
//!
//! ## Features
//! - `file-logging`: daily-rolling log files under timestamped run folders

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Known netdyn crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "netdyn",
    "netdyn-config",
    "netdyn-dynamics",
    "netdyn-engine",
    "netdyn-observability",
];
