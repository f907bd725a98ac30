// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-netdyn-engine` to raise one crate to debug level.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Per-crate debug switches
///
/// # Example
/// ```rust
/// use netdyn_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-netdyn-engine".to_string()]);
/// assert!(flags.is_enabled("netdyn-engine"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Parse debug flags from command-line arguments
    ///
    /// Looks for arguments matching `--debug-{crate-name}`; `--debug-all` enables
    /// every known crate.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enable(crate_name);
            }
        }
        flags
    }

    pub fn enable(&mut self, crate_name: &str) {
        let crate_name = crate_name.trim();
        if !crate_name.is_empty() {
            self.enabled_crates.insert(crate_name.to_string());
        }
    }

    pub fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enable(crate_name);
        }
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `DEBUG` if enabled for `crate_name`, `INFO` otherwise
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Build an `EnvFilter` directive string.
    ///
    /// Crate names are turned into module targets (`netdyn-engine` becomes
    /// `netdyn_engine`). `default_level` applies to everything else.
    pub fn to_filter_string(&self, default_level: &str) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates
            .iter()
            .map(|crate_name| format!("{}=debug", crate_name.replace('-', "_")))
            .collect();
        filters.push(default_level.to_ascii_lowercase());
        filters.join(",")
    }
}

/// Parse debug flags from process arguments and `NETDYN_DEBUG`
///
/// Environment variable format: comma-separated crate names, or `all`.
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(env_var) = env::var("NETDYN_DEBUG") {
        apply_debug_env(&mut flags, &env_var);
    }
    flags
}

fn apply_debug_env(flags: &mut CrateDebugFlags, value: &str) {
    if value.trim() == "all" {
        flags.enable_all();
    } else {
        for crate_name in value.split(',') {
            flags.enable(crate_name);
        }
    }
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  NETDYN_DEBUG={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  NETDYN_DEBUG=all                               Enable debug for all crates
"#,
        KNOWN_CRATES.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-netdyn-engine".to_string()]);
        assert!(flags.is_enabled("netdyn-engine"));
        assert!(!flags.is_enabled("netdyn-dynamics"));
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_filter_string_uses_module_targets() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-netdyn-engine".to_string()]);
        assert_eq!(flags.to_filter_string("WARN"), "netdyn_engine=debug,warn");
        assert_eq!(CrateDebugFlags::default().to_filter_string("info"), "info");
    }

    #[test]
    fn test_env_value_parsing() {
        let mut flags = CrateDebugFlags::default();
        apply_debug_env(&mut flags, "netdyn-config, netdyn-engine,");
        assert!(flags.is_enabled("netdyn-config"));
        assert!(flags.is_enabled("netdyn-engine"));
        assert_eq!(flags.enabled_crates.len(), 2);
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-netdyn-dynamics".to_string()]);
        assert_eq!(flags.log_level("netdyn-dynamics"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("netdyn-engine"), tracing::Level::INFO);
    }
}
