// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, IntegratorScheme, SimulationConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "netdyn_configuration.toml";

/// Find the netdyn configuration file
///
/// Search order:
/// 1. `NETDYN_CONFIG_PATH` environment variable
/// 2. Current working directory: `./netdyn_configuration.toml`
/// 3. Parent directories (up to 5 levels)
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("NETDYN_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by NETDYN_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "netdyn configuration file '{}' not found in any of these locations:\n{}\n\nSet NETDYN_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML. Semantic
/// checks are left to [`crate::validate_config`].
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<SimulationConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: SimulationConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NETDYN_DT` -> `simulation.dt`
/// - `NETDYN_SIMULATION_LENGTH` -> `simulation.simulation_length`
/// - `NETDYN_NOISE_SEED` -> `noise.seed`
/// - `NETDYN_CONDUCTION_SPEED` -> `connectivity.speed`
/// - `NETDYN_LOG_LEVEL` -> `logging.log_level`
/// - `NETDYN_INTEGRATOR` -> `integrator.scheme`
///
/// Unparseable values are ignored.
pub fn apply_environment_overrides(config: &mut SimulationConfig) {
    let vars: HashMap<String, String> = [
        ("NETDYN_DT", "dt"),
        ("NETDYN_SIMULATION_LENGTH", "simulation_length"),
        ("NETDYN_NOISE_SEED", "noise_seed"),
        ("NETDYN_CONDUCTION_SPEED", "speed"),
        ("NETDYN_LOG_LEVEL", "log_level"),
        ("NETDYN_INTEGRATOR", "integrator"),
    ]
    .iter()
    .filter_map(|(var, key)| env::var(var).ok().map(|value| (key.to_string(), value)))
    .collect();

    apply_cli_overrides(config, &vars);
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"dt": "0.05", "integrator": "heun_stochastic"}`)
pub fn apply_cli_overrides(config: &mut SimulationConfig, cli_args: &HashMap<String, String>) {
    if let Some(dt) = cli_args.get("dt").and_then(|v| v.parse::<f64>().ok()) {
        config.simulation.dt = dt;
    }
    if let Some(length) = cli_args
        .get("simulation_length")
        .and_then(|v| v.parse::<f64>().ok())
    {
        config.simulation.simulation_length = length;
    }
    if let Some(length) = cli_args
        .get("transient_length")
        .and_then(|v| v.parse::<f64>().ok())
    {
        config.simulation.transient_length = length;
    }
    if let Some(seed) = cli_args.get("noise_seed").and_then(|v| v.parse::<u64>().ok()) {
        config.noise.seed = seed;
    }
    if let Some(speed) = cli_args.get("speed").and_then(|v| v.parse::<f64>().ok()) {
        config.connectivity.speed = speed;
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.log_level = value.clone();
    }
    if let Some(scheme) = cli_args
        .get("integrator")
        .and_then(|v| v.parse::<IntegratorScheme>().ok())
    {
        config.integrator.scheme = scheme;
    }
    if let Some(value) = cli_args.get("run_name") {
        config.system.run_name = value.clone();
    }
}
