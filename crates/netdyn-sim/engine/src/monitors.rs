// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Monitors
//!
//! Monitors see every raw integration step and decide on their own cadence
//! when to emit a sample. All of them can record a subset of state variables
//! (`variables_of_interest`); emitted arrays are `(n_voi, nodes, modes)`.
//!
//! | Monitor           | Emits                                   | Sample time          |
//! |-------------------|-----------------------------------------|----------------------|
//! | `Raw`             | every step                              | step time            |
//! | `SubSample`       | every `istep`-th step                   | step time            |
//! | `TemporalAverage` | mean of `istep` consecutive raw states  | mean time of window  |
//!
//! `istep = period / dt` must be a positive integer (relative tolerance 1e-9).

use crate::error::ConfigurationError;
use ndarray::{Array3, Array4, ArrayView3, Axis};
use netdyn_dynamics::StateShape;
use std::fmt::Debug;

/// Relative tolerance when checking that a period is a multiple of `dt`
pub const PERIOD_TOLERANCE: f64 = 1e-9;

/// One emitted observation
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub data: Array3<f64>,
}

pub trait Monitor: Debug + Send {
    fn name(&self) -> &'static str;

    /// Sampling period; `None` for `Raw` before `configure`
    fn period(&self) -> Option<f64>;

    /// Validate against the integration step and state shape, allocate buffers
    fn configure(&mut self, dt: f64, shape: StateShape) -> Result<(), ConfigurationError>;

    /// Offer the state produced by raw step `step` at time `time`
    fn consume_raw_step(&mut self, step: u64, time: f64, state: ArrayView3<f64>);

    /// Take the sample produced by the last consumed step, if any
    fn maybe_emit(&mut self) -> Option<Sample>;

    /// Drop accumulated state; configuration is kept
    fn reset(&mut self);
}

/// Steps per sample for `period`, or an error if `period` is not a positive
/// integer multiple of `dt`.
pub fn resolve_istep(monitor: &'static str, period: f64, dt: f64) -> Result<usize, ConfigurationError> {
    if !(dt.is_finite() && dt > 0.0) {
        return Err(ConfigurationError::InvalidStepSize { dt });
    }
    let bad_period = ConfigurationError::InvalidMonitorPeriod { monitor, period, dt };
    if !(period.is_finite() && period > 0.0) {
        return Err(bad_period);
    }
    let ratio = period / dt;
    let istep = ratio.round();
    if istep < 1.0 || (ratio - istep).abs() > PERIOD_TOLERANCE * ratio.max(1.0) {
        return Err(bad_period);
    }
    Ok(istep as usize)
}

/// Shared variable selection
#[derive(Debug, Clone, Default)]
struct VariableSelection {
    requested: Option<Vec<usize>>,
    resolved: Vec<usize>,
}

impl VariableSelection {
    fn new(requested: Option<Vec<usize>>) -> Self {
        Self {
            requested,
            resolved: Vec::new(),
        }
    }

    fn configure(&mut self, monitor: &'static str, variables: usize) -> Result<(), ConfigurationError> {
        self.resolved = match &self.requested {
            Some(voi) => {
                if let Some(&index) = voi.iter().find(|&&i| i >= variables) {
                    return Err(ConfigurationError::InvalidVariableOfInterest {
                        monitor,
                        index,
                        variables,
                    });
                }
                voi.clone()
            }
            None => (0..variables).collect(),
        };
        Ok(())
    }

    fn count(&self) -> usize {
        self.resolved.len()
    }

    fn select(&self, state: ArrayView3<f64>) -> Array3<f64> {
        if self.resolved.len() == state.len_of(Axis(0))
            && self.resolved.iter().enumerate().all(|(i, &v)| i == v)
        {
            return state.to_owned();
        }
        state.select(Axis(0), &self.resolved)
    }
}

/// Every raw step
#[derive(Debug, Clone, Default)]
pub struct Raw {
    voi: VariableSelection,
    dt: Option<f64>,
    pending: Option<Sample>,
}

impl Raw {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variables_of_interest(voi: Vec<usize>) -> Self {
        Self {
            voi: VariableSelection::new(Some(voi)),
            ..Self::default()
        }
    }
}

impl Monitor for Raw {
    fn name(&self) -> &'static str {
        "Raw"
    }

    fn period(&self) -> Option<f64> {
        self.dt
    }

    fn configure(&mut self, dt: f64, shape: StateShape) -> Result<(), ConfigurationError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ConfigurationError::InvalidStepSize { dt });
        }
        self.voi.configure(self.name(), shape.variables)?;
        self.dt = Some(dt);
        self.pending = None;
        Ok(())
    }

    fn consume_raw_step(&mut self, _step: u64, time: f64, state: ArrayView3<f64>) {
        self.pending = Some(Sample {
            time,
            data: self.voi.select(state),
        });
    }

    fn maybe_emit(&mut self) -> Option<Sample> {
        self.pending.take()
    }

    fn reset(&mut self) {
        self.pending = None;
    }
}

/// Every `istep`-th raw step
#[derive(Debug, Clone)]
pub struct SubSample {
    period: f64,
    voi: VariableSelection,
    istep: usize,
    counter: usize,
    pending: Option<Sample>,
}

impl SubSample {
    pub fn new(period: f64) -> Self {
        Self {
            period,
            voi: VariableSelection::default(),
            istep: 0,
            counter: 0,
            pending: None,
        }
    }

    pub fn with_variables_of_interest(mut self, voi: Vec<usize>) -> Self {
        self.voi = VariableSelection::new(Some(voi));
        self
    }

    pub fn istep(&self) -> usize {
        self.istep
    }
}

impl Monitor for SubSample {
    fn name(&self) -> &'static str {
        "SubSample"
    }

    fn period(&self) -> Option<f64> {
        Some(self.period)
    }

    fn configure(&mut self, dt: f64, shape: StateShape) -> Result<(), ConfigurationError> {
        self.istep = resolve_istep(self.name(), self.period, dt)?;
        self.voi.configure(self.name(), shape.variables)?;
        self.reset();
        Ok(())
    }

    fn consume_raw_step(&mut self, _step: u64, time: f64, state: ArrayView3<f64>) {
        self.counter += 1;
        if self.counter == self.istep {
            self.counter = 0;
            self.pending = Some(Sample {
                time,
                data: self.voi.select(state),
            });
        }
    }

    fn maybe_emit(&mut self) -> Option<Sample> {
        self.pending.take()
    }

    fn reset(&mut self) {
        self.counter = 0;
        self.pending = None;
    }
}

/// Mean over non-overlapping windows of `istep` raw steps
#[derive(Debug, Clone)]
pub struct TemporalAverage {
    period: f64,
    voi: VariableSelection,
    istep: usize,
    /// `(istep, n_voi, nodes, modes)`
    window: Array4<f64>,
    window_time: f64,
    filled: usize,
    pending: Option<Sample>,
}

impl TemporalAverage {
    pub fn new(period: f64) -> Self {
        Self {
            period,
            voi: VariableSelection::default(),
            istep: 0,
            window: Array4::zeros((0, 0, 0, 0)),
            window_time: 0.0,
            filled: 0,
            pending: None,
        }
    }

    pub fn with_variables_of_interest(mut self, voi: Vec<usize>) -> Self {
        self.voi = VariableSelection::new(Some(voi));
        self
    }

    pub fn istep(&self) -> usize {
        self.istep
    }
}

impl Monitor for TemporalAverage {
    fn name(&self) -> &'static str {
        "TemporalAverage"
    }

    fn period(&self) -> Option<f64> {
        Some(self.period)
    }

    fn configure(&mut self, dt: f64, shape: StateShape) -> Result<(), ConfigurationError> {
        self.istep = resolve_istep(self.name(), self.period, dt)?;
        self.voi.configure(self.name(), shape.variables)?;
        self.window = Array4::zeros((self.istep, self.voi.count(), shape.nodes, shape.modes));
        self.reset();
        Ok(())
    }

    fn consume_raw_step(&mut self, _step: u64, time: f64, state: ArrayView3<f64>) {
        if self.istep == 0 {
            return;
        }
        self.window
            .index_axis_mut(Axis(0), self.filled)
            .assign(&self.voi.select(state));
        self.window_time += time;
        self.filled += 1;

        if self.filled == self.istep {
            if let Some(mean) = self.window.mean_axis(Axis(0)) {
                self.pending = Some(Sample {
                    time: self.window_time / self.istep as f64,
                    data: mean,
                });
            }
            self.filled = 0;
            self.window_time = 0.0;
        }
    }

    fn maybe_emit(&mut self) -> Option<Sample> {
        self.pending.take()
    }

    fn reset(&mut self) {
        self.filled = 0;
        self.window_time = 0.0;
        self.pending = None;
    }
}
