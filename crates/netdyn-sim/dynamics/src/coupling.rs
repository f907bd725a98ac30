// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Coupling Functions
//!
//! A coupling function turns delayed neighbour states into the input a node sees.
//! For target node `i` and coupling variable `v`:
//!
//! ```text
//! gx[v, i] = Σ_j W[i, j] · pre(x_i, x_j(t - D[i, j]))
//! c[v, i]  = post(gx[v, i])
//! ```
//!
//! The weighted sum and the delay lookup belong to the engine; this module only
//! defines the element-wise `pre` and `post` transforms.

use crate::error::{DynamicsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub trait Coupling: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Transform applied per edge before weighting.
    /// `x_i` is the target's current value, `x_j` the source's delayed value.
    #[inline]
    fn pre(&self, _x_i: f64, x_j: f64) -> f64 {
        x_j
    }

    /// Transform applied to the weighted sum
    fn post(&self, gx: f64) -> f64;

    /// True when `pre` reads the target value. When false the engine skips the
    /// target lookup and passes `0.0` as `x_i`.
    fn uses_target_state(&self) -> bool {
        false
    }

    fn validate(&self) -> Result<()>;
}

fn check_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DynamicsError::InvalidParameter {
            name: name.to_string(),
            value,
            reason: "must be finite",
        })
    }
}

/// `post(gx) = a · gx + b`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Linear {
    pub a: f64,
    pub b: f64,
}

impl Default for Linear {
    fn default() -> Self {
        Self {
            a: 0.00390625,
            b: 0.0,
        }
    }
}

impl Linear {
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }
}

impl Coupling for Linear {
    fn name(&self) -> &'static str {
        "Linear"
    }

    #[inline]
    fn post(&self, gx: f64) -> f64 {
        self.a * gx + self.b
    }

    fn validate(&self) -> Result<()> {
        check_finite("a", self.a)?;
        check_finite("b", self.b)
    }
}

/// `post(gx) = cmin + (cmax - cmin) / (1 + exp(-a · (gx - midpoint) / sigma))`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sigmoidal {
    pub cmin: f64,
    pub cmax: f64,
    pub midpoint: f64,
    pub a: f64,
    pub sigma: f64,
}

impl Default for Sigmoidal {
    fn default() -> Self {
        Self {
            cmin: -1.0,
            cmax: 1.0,
            midpoint: 0.0,
            a: 1.0,
            sigma: 230.0,
        }
    }
}

impl Coupling for Sigmoidal {
    fn name(&self) -> &'static str {
        "Sigmoidal"
    }

    #[inline]
    fn post(&self, gx: f64) -> f64 {
        self.cmin
            + (self.cmax - self.cmin) / (1.0 + (-self.a * (gx - self.midpoint) / self.sigma).exp())
    }

    fn validate(&self) -> Result<()> {
        check_finite("cmin", self.cmin)?;
        check_finite("cmax", self.cmax)?;
        check_finite("midpoint", self.midpoint)?;
        check_finite("a", self.a)?;
        check_finite("sigma", self.sigma)?;
        if self.sigma == 0.0 {
            return Err(DynamicsError::InvalidParameter {
                name: "sigma".to_string(),
                value: self.sigma,
                reason: "must be non-zero",
            });
        }
        if self.cmax < self.cmin {
            return Err(DynamicsError::InvalidParameter {
                name: "cmax".to_string(),
                value: self.cmax,
                reason: "must be >= cmin",
            });
        }
        Ok(())
    }
}

/// Diffusive coupling: `pre = x_j - x_i`, `post = a · gx`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Difference {
    pub a: f64,
}

impl Default for Difference {
    fn default() -> Self {
        Self { a: 0.1 }
    }
}

impl Coupling for Difference {
    fn name(&self) -> &'static str {
        "Difference"
    }

    #[inline]
    fn pre(&self, x_i: f64, x_j: f64) -> f64 {
        x_j - x_i
    }

    #[inline]
    fn post(&self, gx: f64) -> f64 {
        self.a * gx
    }

    fn uses_target_state(&self) -> bool {
        true
    }

    fn validate(&self) -> Result<()> {
        check_finite("a", self.a)
    }
}
