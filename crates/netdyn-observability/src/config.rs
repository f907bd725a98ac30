// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging options

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options for [`crate::init_logging`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingOptions {
    /// Default level for targets without a debug flag (trace, debug, info, warn, error)
    pub level: String,
    /// Also write log files (requires the `file-logging` feature)
    pub file_logging: bool,
    /// Base directory for run folders
    pub log_dir: PathBuf,
    /// Remove run folders older than this
    pub retention_days: u64,
    /// Keep at most this many run folders
    pub retention_runs: usize,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: false,
            log_dir: PathBuf::from("./logs"),
            retention_days: 30,
            retention_runs: 10,
        }
    }
}
