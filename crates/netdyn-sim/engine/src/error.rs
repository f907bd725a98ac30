// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the simulation engine

use netdyn_dynamics::DynamicsError;

/// Raised by `configure()`, by construction of connectivity/surface/monitors,
/// and by stepping an engine that is not configured.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error(transparent)]
    Dynamics(#[from] DynamicsError),

    #[error("invalid connectivity: {0}")]
    InvalidConnectivity(String),

    #[error("conduction speed must be finite and > 0, got {speed}")]
    InvalidConductionSpeed { speed: f64 },

    #[error("integration step size must be finite and > 0, got {dt}")]
    InvalidStepSize { dt: f64 },

    #[error("monitor {monitor}: period {period} is not a positive integer multiple of dt = {dt}")]
    InvalidMonitorPeriod {
        monitor: &'static str,
        period: f64,
        dt: f64,
    },

    #[error("monitor {monitor}: variable of interest {index} out of range for {variables} state variables")]
    InvalidVariableOfInterest {
        monitor: &'static str,
        index: usize,
        variables: usize,
    },

    #[error("invalid surface: {0}")]
    InvalidSurface(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("initial conditions shape mismatch: expected {expected:?}, got {actual:?}")]
    InitialConditionsShape {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("initial conditions contain a non-finite value")]
    NonFiniteInitialConditions,

    #[error("simulation length must be finite and >= 0, got {length}")]
    InvalidSimulationLength { length: f64 },

    #[error("simulator is not configured; call configure() first")]
    NotConfigured,

    #[error("simulator faulted after a numeric error; call configure() or reset() first")]
    Faulted,
}

/// Raised from inside a step
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NumericError {
    #[error("non-finite state at step {step}: variable {variable}, node {node}, mode {mode}")]
    NonFiniteState {
        step: u64,
        variable: usize,
        node: usize,
        mode: usize,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HistoryError {
    #[error("history horizon must be > 0")]
    InvalidHorizon,

    #[error("requested delay of {steps_ago} steps exceeds history horizon {horizon}")]
    DelayExceedsHorizon { steps_ago: usize, horizon: usize },

    #[error("node {node} out of range for {nodes} nodes")]
    NodeOutOfRange { node: usize, nodes: usize },

    #[error("state shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

/// Item error of a simulation run, and error of every fallible engine call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("numeric error: {0}")]
    Numeric(#[from] NumericError),

    #[error("history error: {0}")]
    History(#[from] HistoryError),

    #[error("parameter error: {0}")]
    Parameter(DynamicsError),
}

impl From<DynamicsError> for SimulationError {
    fn from(err: DynamicsError) -> Self {
        SimulationError::Configuration(ConfigurationError::Dynamics(err))
    }
}

impl SimulationError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, SimulationError::Configuration(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, SimulationError::Numeric(_))
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, SimulationError>;
