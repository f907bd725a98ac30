// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Model and parameter traits

use crate::error::{DynamicsError, Result};
use ndarray::{Array3, ArrayView3, Axis};
use std::fmt::Debug;
use tracing::{debug, warn};

/// Parameter block of a model.
///
/// Parameters are addressed by name so that schedules, configuration files and
/// run-time updates can reach them without knowing the concrete model type.
pub trait ModelParameters: Debug + Clone + Send {
    /// Check every parameter against its admissible range
    fn validate(&self) -> Result<()>;

    /// All parameter names, in a stable order
    fn parameter_names() -> &'static [&'static str];

    fn get(&self, name: &str) -> Option<f64>;

    /// Set a single parameter. Unknown names are an error; the value itself is
    /// checked by the next `validate()`.
    fn set(&mut self, name: &str, value: f64) -> Result<()>;
}

/// Local dynamics of one node type.
///
/// Implementations must be deterministic: `dfun` is a pure function of its
/// inputs and the current parameters.
pub trait Model: Debug + Send {
    fn name(&self) -> &'static str;

    fn state_variables(&self) -> &'static [&'static str];

    fn number_of_state_variables(&self) -> usize {
        self.state_variables().len()
    }

    fn number_of_modes(&self) -> usize {
        1
    }

    /// Indices of the state variables that are exchanged through coupling
    fn coupling_variables(&self) -> &[usize];

    /// Typical range of each state variable, used for random initial conditions
    fn state_variable_range(&self) -> Vec<(f64, f64)>;

    /// Hard bounds per state variable; `None` leaves the variable unbounded
    fn state_variable_boundaries(&self) -> Vec<Option<(f64, f64)>> {
        vec![None; self.number_of_state_variables()]
    }

    /// Clamp `state` in place to `state_variable_boundaries()`.
    /// The boundaries must have passed `validate_boundaries()`.
    fn clamp(&self, state: &mut Array3<f64>) {
        for (v, bounds) in self.state_variable_boundaries().into_iter().enumerate() {
            if let Some((lo, hi)) = bounds {
                state
                    .index_axis_mut(Axis(0), v)
                    .mapv_inplace(|x| x.clamp(lo, hi));
            }
        }
    }

    /// Time derivative of `state`.
    ///
    /// `state` is `(state variables, nodes, modes)`; `coupling` is
    /// `(coupling variables, nodes, modes)`, ordered like `coupling_variables()`.
    fn dfun(&self, state: ArrayView3<f64>, coupling: ArrayView3<f64>) -> Array3<f64>;

    fn parameter_names(&self) -> &'static [&'static str];

    fn parameter(&self, name: &str) -> Option<f64>;

    /// Update one parameter. A rejected value leaves the model unchanged.
    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()>;

    fn validate(&self) -> Result<()>;

    /// Check coupling variable indices against the state-variable count
    fn validate_coupling_variables(&self) -> Result<()> {
        let variables = self.number_of_state_variables();
        match self.coupling_variables().iter().find(|&&i| i >= variables) {
            Some(&index) => Err(DynamicsError::InvalidCouplingVariable { index, variables }),
            None => Ok(()),
        }
    }

    /// One entry per state variable, each finite-or-infinite with `lo <= hi`
    fn validate_boundaries(&self) -> Result<()> {
        let boundaries = self.state_variable_boundaries();
        let variables = self.number_of_state_variables();
        if boundaries.len() != variables {
            return Err(DynamicsError::InvalidBoundary {
                variable: boundaries.len().min(variables),
                reason: format!("{} boundaries for {} state variables", boundaries.len(), variables),
            });
        }
        for (variable, bounds) in boundaries.into_iter().enumerate() {
            if let Some((lo, hi)) = bounds {
                if lo.is_nan() || hi.is_nan() || lo > hi {
                    return Err(DynamicsError::InvalidBoundary {
                        variable,
                        reason: format!("need lo <= hi, got ({lo}, {hi})"),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Shared `set_parameter` body: apply, validate, roll back on failure.
pub(crate) fn set_checked<P: ModelParameters>(params: &mut P, name: &str, value: f64) -> Result<()> {
    let previous = params.clone();
    params.set(name, value)?;
    if let Err(err) = params.validate() {
        warn!("[MODEL] Rejected {}={}: {}", name, value, err);
        *params = previous;
        return Err(err);
    }
    debug!("[MODEL] {}={}", name, value);
    Ok(())
}
