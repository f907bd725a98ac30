// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for dynamics components

/// Errors raised while validating or configuring models, couplings, noise and integrators.
///
/// All of these are configuration-time failures: nothing in this crate raises an error
/// from inside an integration step.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DynamicsError {
    #[error("integration step size must be finite and > 0, got {dt}")]
    InvalidStepSize { dt: f64 },

    #[error("noise intensity has {actual} entries but the model has {expected} state variables")]
    NoiseShapeMismatch { expected: usize, actual: usize },

    #[error("noise intensity for state variable {index} must be finite and >= 0, got {value}")]
    InvalidNoiseIntensity { index: usize, value: f64 },

    #[error("unknown parameter '{name}' for {model}")]
    UnknownParameter { model: &'static str, name: String },

    #[error("invalid value {value} for parameter '{name}': {reason}")]
    InvalidParameter {
        name: String,
        value: f64,
        reason: &'static str,
    },

    #[error("array shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: [usize; 3],
        actual: [usize; 3],
    },

    #[error("coupling variable index {index} out of range for {variables} state variables")]
    InvalidCouplingVariable { index: usize, variables: usize },

    #[error("invalid boundary for state variable {variable}: {reason}")]
    InvalidBoundary { variable: usize, reason: String },

    #[error("invalid equation: {0}")]
    InvalidEquation(String),
}

/// Result type for dynamics operations
pub type Result<T> = core::result::Result<T, DynamicsError>;
