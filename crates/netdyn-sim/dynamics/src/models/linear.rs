// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Linear Model
//!
//! Single state variable relaxing towards zero and driven by coupling.
//!
//! ```text
//! dx/dt = gamma · x + c
//! ```
//!
//! Stable for `gamma < 0`. Mostly useful for testing connectivity and delays,
//! since the network response is the only interesting behaviour.

use super::traits::{set_checked, Model, ModelParameters};
use crate::error::{DynamicsError, Result};
use ndarray::{Array3, ArrayView3};
use serde::{Deserialize, Serialize};

const STATE_VARIABLES: &[&str] = &["x"];
const PARAMETER_NAMES: &[&str] = &["gamma"];
const COUPLING_VARIABLES: &[usize] = &[0];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearParameters {
    /// Decay rate; negative for a stable fixed point at zero
    pub gamma: f64,
}

impl Default for LinearParameters {
    fn default() -> Self {
        Self { gamma: -10.0 }
    }
}

impl ModelParameters for LinearParameters {
    fn validate(&self) -> Result<()> {
        if !self.gamma.is_finite() {
            return Err(DynamicsError::InvalidParameter {
                name: "gamma".to_string(),
                value: self.gamma,
                reason: "must be finite",
            });
        }
        Ok(())
    }

    fn parameter_names() -> &'static [&'static str] {
        PARAMETER_NAMES
    }

    fn get(&self, name: &str) -> Option<f64> {
        match name {
            "gamma" => Some(self.gamma),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "gamma" => self.gamma = value,
            _ => {
                return Err(DynamicsError::UnknownParameter {
                    model: "Linear",
                    name: name.to_string(),
                })
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LinearModel {
    pub params: LinearParameters,
}

impl LinearModel {
    pub fn new(gamma: f64) -> Self {
        Self {
            params: LinearParameters { gamma },
        }
    }
}

impl Model for LinearModel {
    fn name(&self) -> &'static str {
        "Linear"
    }

    fn state_variables(&self) -> &'static [&'static str] {
        STATE_VARIABLES
    }

    fn coupling_variables(&self) -> &[usize] {
        COUPLING_VARIABLES
    }

    fn state_variable_range(&self) -> Vec<(f64, f64)> {
        vec![(-1.0, 1.0)]
    }

    fn dfun(&self, state: ArrayView3<f64>, coupling: ArrayView3<f64>) -> Array3<f64> {
        let gamma = self.params.gamma;
        let mut dx = state.mapv(|x| gamma * x);
        dx += &coupling;
        dx
    }

    fn parameter_names(&self) -> &'static [&'static str] {
        PARAMETER_NAMES
    }

    fn parameter(&self, name: &str) -> Option<f64> {
        self.params.get(name)
    }

    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        set_checked(&mut self.params, name, value)
    }

    fn validate(&self) -> Result<()> {
        self.params.validate()?;
        self.validate_coupling_variables()
    }
}
