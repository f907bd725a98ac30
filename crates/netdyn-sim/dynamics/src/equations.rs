// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Scalar equations used as spatial kernels and temporal parameter profiles.
//!
//! The same `Equation` value serves two purposes:
//! - as a distance kernel for local (surface) connectivity, evaluated at `|x_i - x_k|`
//! - as a time profile for run-time parameter schedules, evaluated at simulation time
//!
//! ```text
//! Gaussian:    amp · exp(-(x - midpoint)² / (2σ²)) + offset
//! MexicanHat:  amp1 · exp(-(x - midpoint)² / (2σ1²)) - amp2 · exp(-(x - midpoint)² / (2σ2²))
//! Linear:      a · x + b
//! ```

use crate::error::{DynamicsError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Equation {
    Gaussian {
        amp: f64,
        sigma: f64,
        midpoint: f64,
        #[serde(default)]
        offset: f64,
    },
    MexicanHat {
        amp1: f64,
        sigma1: f64,
        amp2: f64,
        sigma2: f64,
        #[serde(default)]
        midpoint: f64,
    },
    Linear {
        a: f64,
        #[serde(default)]
        b: f64,
    },
}

impl Equation {
    /// Unit Gaussian centred at zero
    pub fn gaussian() -> Self {
        Equation::Gaussian {
            amp: 1.0,
            sigma: 1.0,
            midpoint: 0.0,
            offset: 0.0,
        }
    }

    /// Narrow excitatory centre, broad inhibitory surround
    pub fn mexican_hat() -> Self {
        Equation::MexicanHat {
            amp1: 1.0,
            sigma1: 10.0,
            amp2: 0.5,
            sigma2: 20.0,
            midpoint: 0.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let finite = |name: &str, v: f64| {
            if v.is_finite() {
                Ok(())
            } else {
                Err(DynamicsError::InvalidEquation(format!(
                    "{} must be finite, got {}",
                    name, v
                )))
            }
        };
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(DynamicsError::InvalidEquation(format!(
                    "{} must be finite and > 0, got {}",
                    name, v
                )))
            }
        };

        match *self {
            Equation::Gaussian {
                amp,
                sigma,
                midpoint,
                offset,
            } => {
                finite("amp", amp)?;
                positive("sigma", sigma)?;
                finite("midpoint", midpoint)?;
                finite("offset", offset)
            }
            Equation::MexicanHat {
                amp1,
                sigma1,
                amp2,
                sigma2,
                midpoint,
            } => {
                finite("amp1", amp1)?;
                positive("sigma1", sigma1)?;
                finite("amp2", amp2)?;
                positive("sigma2", sigma2)?;
                finite("midpoint", midpoint)
            }
            Equation::Linear { a, b } => {
                finite("a", a)?;
                finite("b", b)
            }
        }
    }

    #[inline]
    pub fn evaluate(&self, x: f64) -> f64 {
        match *self {
            Equation::Gaussian {
                amp,
                sigma,
                midpoint,
                offset,
            } => amp * gaussian_bump(x - midpoint, sigma) + offset,
            Equation::MexicanHat {
                amp1,
                sigma1,
                amp2,
                sigma2,
                midpoint,
            } => {
                let dx = x - midpoint;
                amp1 * gaussian_bump(dx, sigma1) - amp2 * gaussian_bump(dx, sigma2)
            }
            Equation::Linear { a, b } => a * x + b,
        }
    }

    /// Evaluate at every point of `xs`
    pub fn pattern(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }
}

#[inline]
fn gaussian_bump(dx: f64, sigma: f64) -> f64 {
    (-(dx * dx) / (2.0 * sigma * sigma)).exp()
}
