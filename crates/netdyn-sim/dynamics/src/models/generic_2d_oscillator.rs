// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Generic 2D Oscillator
//!
//! Two-variable planar oscillator covering FitzHugh-Nagumo, Morris-Lecar-like and
//! excitable regimes depending on parameters.
//!
//! ## Model Dynamics
//!
//! ```text
//! dV/dt = d · tau · (alpha · W - f · V³ + e · V² + g · V + gamma · I + gamma · c)
//! dW/dt = d · (a + b · V + c · V² - beta · W) / tau
//!
//!     Where:
//!     - V = fast (voltage-like) variable, the coupling variable
//!     - W = slow recovery variable
//!     - c = long-range coupling input, plus local coupling on surfaces;
//!       both are scaled by gamma
//! ```
//!
//! Defaults put the node in a stable fixed point close to a Hopf bifurcation.

use super::traits::{set_checked, Model, ModelParameters};
use crate::error::{DynamicsError, Result};
use ndarray::{Array3, ArrayView3, Axis, Zip};
use serde::{Deserialize, Serialize};

const STATE_VARIABLES: &[&str] = &["V", "W"];
const PARAMETER_NAMES: &[&str] = &[
    "tau", "I", "a", "b", "c", "d", "e", "f", "g", "alpha", "beta", "gamma",
];
const COUPLING_VARIABLES: &[usize] = &[0];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Generic2dOscillatorParameters {
    /// Time-scale separation between V and W
    pub tau: f64,
    /// Baseline external input
    #[serde(rename = "I")]
    pub i_ext: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    /// Temporal scaling of both equations
    pub d: f64,
    pub e: f64,
    pub f: f64,
    pub g: f64,
    pub alpha: f64,
    pub beta: f64,
    /// Input scaling (external and coupling)
    pub gamma: f64,
}

impl Default for Generic2dOscillatorParameters {
    fn default() -> Self {
        Self {
            tau: 1.0,
            i_ext: 0.0,
            a: -2.0,
            b: -10.0,
            c: 0.0,
            d: 0.02,
            e: 3.0,
            f: 1.0,
            g: 0.0,
            alpha: 1.0,
            beta: 1.0,
            gamma: 1.0,
        }
    }
}

impl Generic2dOscillatorParameters {
    fn slot_mut(&mut self, name: &str) -> Option<&mut f64> {
        Some(match name {
            "tau" => &mut self.tau,
            "I" => &mut self.i_ext,
            "a" => &mut self.a,
            "b" => &mut self.b,
            "c" => &mut self.c,
            "d" => &mut self.d,
            "e" => &mut self.e,
            "f" => &mut self.f,
            "g" => &mut self.g,
            "alpha" => &mut self.alpha,
            "beta" => &mut self.beta,
            "gamma" => &mut self.gamma,
            _ => return None,
        })
    }
}

impl ModelParameters for Generic2dOscillatorParameters {
    fn validate(&self) -> Result<()> {
        for &name in PARAMETER_NAMES {
            let value = self.get(name).unwrap_or(f64::NAN);
            if !value.is_finite() {
                return Err(DynamicsError::InvalidParameter {
                    name: name.to_string(),
                    value,
                    reason: "must be finite",
                });
            }
        }
        if self.tau <= 0.0 {
            return Err(DynamicsError::InvalidParameter {
                name: "tau".to_string(),
                value: self.tau,
                reason: "must be > 0",
            });
        }
        if self.d <= 0.0 {
            return Err(DynamicsError::InvalidParameter {
                name: "d".to_string(),
                value: self.d,
                reason: "must be > 0",
            });
        }
        Ok(())
    }

    fn parameter_names() -> &'static [&'static str] {
        PARAMETER_NAMES
    }

    fn get(&self, name: &str) -> Option<f64> {
        let mut copy = *self;
        copy.slot_mut(name).map(|slot| *slot)
    }

    fn set(&mut self, name: &str, value: f64) -> Result<()> {
        match self.slot_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(DynamicsError::UnknownParameter {
                model: "Generic2dOscillator",
                name: name.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Generic2dOscillator {
    pub params: Generic2dOscillatorParameters,
}

impl Generic2dOscillator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameters(params: Generic2dOscillatorParameters) -> Self {
        Self { params }
    }
}

impl Model for Generic2dOscillator {
    fn name(&self) -> &'static str {
        "Generic2dOscillator"
    }

    fn state_variables(&self) -> &'static [&'static str] {
        STATE_VARIABLES
    }

    fn coupling_variables(&self) -> &[usize] {
        COUPLING_VARIABLES
    }

    fn state_variable_range(&self) -> Vec<(f64, f64)> {
        vec![(-2.0, 4.0), (-6.0, 6.0)]
    }

    fn dfun(&self, state: ArrayView3<f64>, coupling: ArrayView3<f64>) -> Array3<f64> {
        let p = &self.params;
        let mut derivative = Array3::zeros(state.raw_dim());
        let v = state.index_axis(Axis(0), 0);
        let w = state.index_axis(Axis(0), 1);
        let c0 = coupling.index_axis(Axis(0), 0);

        let (mut dv, mut dw) = derivative.view_mut().split_at(Axis(0), 1);
        Zip::from(dv.index_axis_mut(Axis(0), 0))
            .and(dw.index_axis_mut(Axis(0), 0))
            .and(&v)
            .and(&w)
            .and(&c0)
            .for_each(|dv, dw, &v, &w, &c| {
                let v2 = v * v;
                *dv = p.d
                    * p.tau
                    * (p.alpha * w - p.f * v2 * v + p.e * v2 + p.g * v
                        + p.gamma * p.i_ext
                        + p.gamma * c);
                *dw = p.d * (p.a + p.b * v + p.c * v2 - p.beta * w) / p.tau;
            });
        derivative
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
