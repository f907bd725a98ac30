// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Additive Noise
//!
//! White Gaussian noise with a per-state-variable intensity `nsig`. One step of
//! length `dt` receives the increment
//!
//! ```text
//! η[v, n, m] = sqrt(2 · nsig[v]) · sqrt(dt) · z,    z ~ N(0, 1)
//! ```
//!
//! The stream is driven by a seeded `StdRng`, so two noise sources built with the
//! same seed produce identical increment sequences. `reset()` rewinds the stream.

use crate::error::{DynamicsError, Result};
use crate::state::StateShape;
use ndarray::{Array1, Array3, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

#[derive(Debug, Clone)]
pub struct AdditiveNoise {
    nsig: Array1<f64>,
    seed: u64,
    rng: StdRng,
}

impl AdditiveNoise {
    /// Noise with one intensity per state variable
    pub fn new(nsig: Vec<f64>, seed: u64) -> Result<Self> {
        for (index, &value) in nsig.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(DynamicsError::InvalidNoiseIntensity { index, value });
            }
        }
        Ok(Self {
            nsig: Array1::from(nsig),
            seed,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Same intensity for all `nvar` state variables
    pub fn uniform(nsig: f64, nvar: usize, seed: u64) -> Result<Self> {
        Self::new(vec![nsig; nvar], seed)
    }

    pub fn nsig(&self) -> &Array1<f64> {
        &self.nsig
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Intensity vector must match the model's state-variable count exactly
    pub fn check_shape(&self, nvar: usize) -> Result<()> {
        if self.nsig.len() != nvar {
            return Err(DynamicsError::NoiseShapeMismatch {
                expected: nvar,
                actual: self.nsig.len(),
            });
        }
        Ok(())
    }

    /// Draw one increment for a step of length `dt`.
    ///
    /// Values are drawn in row-major `(variable, node, mode)` order.
    pub fn increment(&mut self, shape: StateShape, dt: f64) -> Array3<f64> {
        let sqrt_dt = dt.sqrt();
        let mut eta = Array3::zeros(shape.dim());
        for (v, mut plane) in eta.axis_iter_mut(Axis(0)).enumerate() {
            let scale = (2.0 * self.nsig[v]).sqrt() * sqrt_dt;
            for value in plane.iter_mut() {
                let z: f64 = StandardNormal.sample(&mut self.rng);
                *value = scale * z;
            }
        }
        eta
    }

    /// Rewind the stream to its seed
    pub fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }
}
