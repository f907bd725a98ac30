// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `netdyn_configuration.toml`. Component choices are expressed as a `kind`
//! plus a flat `parameters` table so that this crate stays independent of the
//! simulation crates that interpret them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub simulation: SimulationSection,
    pub integrator: IntegratorConfig,
    pub noise: NoiseConfig,
    pub connectivity: ConnectivityConfig,
    pub model: ModelConfig,
    pub coupling: CouplingConfig,
    pub monitors: Vec<MonitorConfig>,
    pub surface: Option<SurfaceConfig>,
    pub schedule: Option<ScheduleConfig>,
    pub initial_conditions: InitialConditionsConfig,
    pub logging: LoggingConfig,
    pub system: SystemConfig,
}

/// Clock and run length
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationSection {
    /// Integration step (ms)
    pub dt: f64,
    /// Length of the recorded run (ms)
    pub simulation_length: f64,
    /// Run discarded before recording, to clear initial transients (ms)
    pub transient_length: f64,
    /// Log a warning when a single step takes longer than this
    pub slow_step_warn_ms: u64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            dt: 0.1,
            simulation_length: 1000.0,
            transient_length: 0.0,
            slow_step_warn_ms: 20,
        }
    }
}

/// Integration scheme selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorScheme {
    EulerDeterministic,
    #[default]
    HeunDeterministic,
    EulerStochastic,
    HeunStochastic,
}

impl IntegratorScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EulerDeterministic => "euler_deterministic",
            Self::HeunDeterministic => "heun_deterministic",
            Self::EulerStochastic => "euler_stochastic",
            Self::HeunStochastic => "heun_stochastic",
        }
    }

    pub fn is_stochastic(&self) -> bool {
        matches!(self, Self::EulerStochastic | Self::HeunStochastic)
    }
}

impl fmt::Display for IntegratorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntegratorScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "euler_deterministic" | "euler" => Ok(Self::EulerDeterministic),
            "heun_deterministic" | "heun" => Ok(Self::HeunDeterministic),
            "euler_stochastic" => Ok(Self::EulerStochastic),
            "heun_stochastic" => Ok(Self::HeunStochastic),
            other => Err(format!("unknown integrator scheme '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IntegratorConfig {
    pub scheme: IntegratorScheme,
}

/// Additive noise for stochastic schemes
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Per-state-variable intensity; must match the model's state variables
    pub nsig: Option<Vec<f64>>,
    /// Intensity applied to every state variable when `nsig` is absent
    pub intensity: f64,
    pub seed: u64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            nsig: None,
            intensity: 0.001,
            seed: 42,
        }
    }
}

/// Structural connectivity, inline
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// Row = target, column = source
    pub weights: Vec<Vec<f64>>,
    /// Same layout as `weights` (mm)
    pub tract_lengths: Vec<Vec<f64>>,
    /// Conduction speed (mm/ms)
    pub speed: f64,
    pub labels: Vec<String>,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            weights: Vec::new(),
            tract_lengths: Vec::new(),
            speed: 3.0,
            labels: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Linear,
    #[default]
    Generic2dOscillator,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    pub kind: ModelKind,
    /// Overrides for the model's default parameters, by name
    pub parameters: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CouplingKind {
    #[default]
    Linear,
    Sigmoidal,
    Difference,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CouplingConfig {
    pub kind: CouplingKind,
    pub parameters: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorKind {
    #[default]
    Raw,
    TemporalAverage,
    SubSample,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub kind: MonitorKind,
    /// Sampling period (ms); ignored for `raw`
    pub period: Option<f64>,
    /// Indices of state variables to record; all when absent
    pub variables_of_interest: Option<Vec<usize>>,
}

/// Scalar equation, as `kind` plus named parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EquationConfig {
    /// `gaussian`, `mexican_hat` or `linear`
    pub kind: String,
    pub parameters: BTreeMap<String, f64>,
}

impl Default for EquationConfig {
    fn default() -> Self {
        Self {
            kind: "gaussian".to_string(),
            parameters: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalConnectivityConfig {
    /// Maximum vertex-to-vertex distance (mm)
    pub cutoff: f64,
    pub kernel: EquationConfig,
}

impl Default for LocalConnectivityConfig {
    fn default() -> Self {
        Self {
            cutoff: 40.0,
            kernel: EquationConfig {
                kind: "mexican_hat".to_string(),
                parameters: BTreeMap::new(),
            },
        }
    }
}

/// Cortical surface; when present, simulation nodes are surface vertices
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub vertices: Vec<[f64; 3]>,
    /// Region index of each vertex
    pub region_mapping: Vec<usize>,
    pub coupling_strength: f64,
    pub local_connectivity: Option<LocalConnectivityConfig>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            region_mapping: Vec::new(),
            coupling_strength: 0.0,
            local_connectivity: None,
        }
    }
}

/// Smooth run-time variation of one model parameter
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub parameter: String,
    /// Evaluated at simulation time (ms)
    pub equation: EquationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialConditionsKind {
    #[default]
    Random,
    Constant,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InitialConditionsConfig {
    pub kind: InitialConditionsKind,
    /// Seed for `random`
    pub seed: u64,
    /// One value per state variable for `constant`
    pub values: Vec<f64>,
}

impl Default for InitialConditionsConfig {
    fn default() -> Self {
        Self {
            kind: InitialConditionsKind::Random,
            seed: 42,
            values: Vec::new(),
        }
    }
}

/// Logging output
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_level: String,
    /// Crates to log at debug level, e.g. `["netdyn-engine"]`
    pub debug_crates: Vec<String>,
    pub file_logging: bool,
    pub log_dir: PathBuf,
    pub retention_days: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_crates: Vec::new(),
            file_logging: false,
            log_dir: PathBuf::from("logs"),
            retention_days: 7,
        }
    }
}

/// Output and run identification
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    pub run_name: String,
    /// Write the run summary here instead of stdout
    pub summary_path: Option<PathBuf>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            run_name: "netdyn".to_string(),
            summary_path: None,
        }
    }
}
