// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Integration Schemes
//!
//! Fixed-step schemes advancing `dx/dt = f(x, c) (+ noise)` by one step `dt`.
//!
//! ```text
//! Euler:          x' = x + dt · f(x, c) + η
//! Heun:           x̃  = x + dt · f(x, c) + η
//!                 x' = x + dt/2 · (f(x, c) + f(x̃, c)) + η
//! ```
//!
//! The coupling `c` is computed once per step. Each sub-stage takes one noise
//! sample; Heun's predictor and corrector share the same sample, so the stream
//! advances once per step. Model boundaries are applied after each stage.

use crate::error::{DynamicsError, Result};
use crate::models::Model;
use crate::noise::AdditiveNoise;
use crate::state::StateShape;
use ndarray::{Array3, ArrayView3};
use std::fmt::Debug;

pub trait Integrator: Debug + Send {
    fn scheme_name(&self) -> &'static str;

    fn dt(&self) -> f64;

    fn is_stochastic(&self) -> bool {
        self.noise().is_some()
    }

    fn noise(&self) -> Option<&AdditiveNoise> {
        None
    }

    fn noise_mut(&mut self) -> Option<&mut AdditiveNoise> {
        None
    }

    /// Validate the step size and, for stochastic schemes, the noise shape
    fn configure(&mut self, nvar: usize) -> Result<()>;

    /// Advance `state` by one step. Bounds are applied; non-finite values are
    /// passed through for the caller to detect.
    fn step(
        &mut self,
        model: &dyn Model,
        state: ArrayView3<f64>,
        coupling: ArrayView3<f64>,
    ) -> Array3<f64>;

    /// Rewind any internal random stream
    fn reset(&mut self) {}
}

fn check_dt(dt: f64) -> Result<()> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    } else {
        Err(DynamicsError::InvalidStepSize { dt })
    }
}

fn euler(
    model: &dyn Model,
    state: ArrayView3<f64>,
    coupling: ArrayView3<f64>,
    dt: f64,
    eta: Option<&Array3<f64>>,
) -> Array3<f64> {
    let mut next = model.dfun(state, coupling);
    next *= dt;
    next += &state;
    if let Some(eta) = eta {
        next += eta;
    }
    model.clamp(&mut next);
    next
}

fn heun(
    model: &dyn Model,
    state: ArrayView3<f64>,
    coupling: ArrayView3<f64>,
    dt: f64,
    eta: Option<&Array3<f64>>,
) -> Array3<f64> {
    let d1 = model.dfun(state, coupling);

    let mut inter = &d1 * dt;
    inter += &state;
    if let Some(eta) = eta {
        inter += eta;
    }
    model.clamp(&mut inter);

    let d2 = model.dfun(inter.view(), coupling);
    let mut next = d1 + d2;
    next *= dt / 2.0;
    next += &state;
    if let Some(eta) = eta {
        next += eta;
    }
    model.clamp(&mut next);
    next
}

#[derive(Debug, Clone)]
pub struct EulerDeterministic {
    pub dt: f64,
}

impl EulerDeterministic {
    pub fn new(dt: f64) -> Self {
        Self { dt }
    }
}

impl Integrator for EulerDeterministic {
    fn scheme_name(&self) -> &'static str {
        "EulerDeterministic"
    }

    fn dt(&self) -> f64 {
        self.dt
    }

    fn configure(&mut self, _nvar: usize) -> Result<()> {
        check_dt(self.dt)
    }

    fn step(
        &mut self,
        model: &dyn Model,
        state: ArrayView3<f64>,
        coupling: ArrayView3<f64>,
    ) -> Array3<f64> {
        euler(model, state, coupling, self.dt, None)
    }
}

#[derive(Debug, Clone)]
pub struct HeunDeterministic {
    pub dt: f64,
}

impl HeunDeterministic {
    pub fn new(dt: f64) -> Self {
        Self { dt }
    }
}

impl Integrator for HeunDeterministic {
    fn scheme_name(&self) -> &'static str {
        "HeunDeterministic"
    }

    fn dt(&self) -> f64 {
        self.dt
    }

    fn configure(&mut self, _nvar: usize) -> Result<()> {
        check_dt(self.dt)
    }

    fn step(
        &mut self,
        model: &dyn Model,
        state: ArrayView3<f64>,
        coupling: ArrayView3<f64>,
    ) -> Array3<f64> {
        heun(model, state, coupling, self.dt, None)
    }
}

/// Euler-Maruyama
#[derive(Debug, Clone)]
pub struct EulerStochastic {
    pub dt: f64,
    pub noise: AdditiveNoise,
}

impl EulerStochastic {
    pub fn new(dt: f64, noise: AdditiveNoise) -> Self {
        Self { dt, noise }
    }
}

impl Integrator for EulerStochastic {
    fn scheme_name(&self) -> &'static str {
        "EulerStochastic"
    }

    fn dt(&self) -> f64 {
        self.dt
    }

    fn noise(&self) -> Option<&AdditiveNoise> {
        Some(&self.noise)
    }

    fn noise_mut(&mut self) -> Option<&mut AdditiveNoise> {
        Some(&mut self.noise)
    }

    fn configure(&mut self, nvar: usize) -> Result<()> {
        check_dt(self.dt)?;
        self.noise.check_shape(nvar)
    }

    fn step(
        &mut self,
        model: &dyn Model,
        state: ArrayView3<f64>,
        coupling: ArrayView3<f64>,
    ) -> Array3<f64> {
        let eta = self.noise.increment(StateShape::of(&state), self.dt);
        euler(model, state, coupling, self.dt, Some(&eta))
    }

    fn reset(&mut self) {
        self.noise.reset();
    }
}

#[derive(Debug, Clone)]
pub struct HeunStochastic {
    pub dt: f64,
    pub noise: AdditiveNoise,
}

impl HeunStochastic {
    pub fn new(dt: f64, noise: AdditiveNoise) -> Self {
        Self { dt, noise }
    }
}

impl Integrator for HeunStochastic {
    fn scheme_name(&self) -> &'static str {
        "HeunStochastic"
    }

    fn dt(&self) -> f64 {
        self.dt
    }

    fn noise(&self) -> Option<&AdditiveNoise> {
        Some(&self.noise)
    }

    fn noise_mut(&mut self) -> Option<&mut AdditiveNoise> {
        Some(&mut self.noise)
    }

    fn configure(&mut self, nvar: usize) -> Result<()> {
        check_dt(self.dt)?;
        self.noise.check_shape(nvar)
    }

    fn step(
        &mut self,
        model: &dyn Model,
        state: ArrayView3<f64>,
        coupling: ArrayView3<f64>,
    ) -> Array3<f64> {
        let eta = self.noise.increment(StateShape::of(&state), self.dt);
        heun(model, state, coupling, self.dt, Some(&eta))
    }

    fn reset(&mut self) {
        self.noise.reset();
    }
}
