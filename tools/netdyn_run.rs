// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Command-line simulation runner.
//!
//! Loads `netdyn_configuration.toml` (or `--config <path>`), applies
//! environment and `--key=value` overrides, runs the simulation and prints a
//! JSON summary to stdout or to `system.summary_path`.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use netdyn::config::{load_config, validate_config};
use netdyn::observability::{debug_flags_help, init_logging, parse_debug_flags, LoggingOptions};
use netdyn::runner::execute;
use tracing::{error, info};

/// Keys accepted as `--key=value`
const OVERRIDE_KEYS: &[&str] = &[
    "dt",
    "simulation_length",
    "transient_length",
    "noise_seed",
    "speed",
    "log_level",
    "integrator",
    "run_name",
];

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: netdyn-run [--config <path>] [--<key>=<value> ...] [--debug-<crate> ...]\n\n\
         Overrides: {}\n\n{}",
        OVERRIDE_KEYS.join(", "),
        debug_flags_help()
    );
    process::exit(2);
}

fn parse_args() -> (Option<PathBuf>, HashMap<String, String>) {
    let mut config_path = None;
    let mut overrides = HashMap::new();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                config_path = Some(PathBuf::from(v));
            }
            "-h" | "--help" => usage_and_exit(),
            other if other.starts_with("--debug-") => {}
            other => {
                let Some((key, value)) = other.strip_prefix("--").and_then(|kv| kv.split_once('=')) else {
                    eprintln!("Unknown argument: {other}");
                    usage_and_exit();
                };
                if !OVERRIDE_KEYS.contains(&key) {
                    eprintln!("Unknown override key: {key}");
                    usage_and_exit();
                }
                overrides.insert(key.to_string(), value.to_string());
            }
        }
    }

    (config_path, overrides)
}

fn main() {
    if let Err(err) = run() {
        error!("{:#}", err);
        eprintln!("netdyn-run: {:#}", err);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let (config_path, overrides) = parse_args();
    let config = load_config(config_path.as_deref(), Some(&overrides))
        .context("Failed to load configuration")?;
    validate_config(&config).context("Invalid configuration")?;

    let mut debug_flags = parse_debug_flags();
    for crate_name in &config.logging.debug_crates {
        debug_flags.enable(crate_name);
    }
    let logging = LoggingOptions {
        level: config.logging.log_level.clone(),
        file_logging: config.logging.file_logging,
        log_dir: config.logging.log_dir.clone(),
        retention_days: config.logging.retention_days,
        ..LoggingOptions::default()
    };
    let _guard = init_logging(&debug_flags, &logging)?;

    info!(
        "[NETDYN-RUN] {} v{}: {} nodes, dt={}, length={}",
        config.system.run_name,
        netdyn::VERSION,
        config.connectivity.weights.len(),
        config.simulation.dt,
        config.simulation.simulation_length
    );

    let summary = execute(&config).context("Simulation failed")?;
    let json = serde_json::to_string_pretty(&summary)?;

    match &config.system.summary_path {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write summary to {}", path.display()))?;
            info!("[NETDYN-RUN] Summary written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
