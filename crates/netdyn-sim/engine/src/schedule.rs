// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Time-varying model parameters
//!
//! A schedule evaluates an [`Equation`] at simulation time and writes the result
//! into one model parameter between steps.

use crate::error::Result;
use crate::simulator::{SimulationRun, Simulator};
use netdyn_dynamics::Equation;

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSchedule {
    parameter: String,
    equation: Equation,
}

impl ParameterSchedule {
    pub fn new(parameter: impl Into<String>, equation: Equation) -> Result<Self> {
        equation.validate()?;
        Ok(Self {
            parameter: parameter.into(),
            equation,
        })
    }

    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    pub fn equation(&self) -> &Equation {
        &self.equation
    }

    pub fn value_at(&self, time: f64) -> f64 {
        self.equation.evaluate(time)
    }

    /// Set the parameter to its value at the simulator's current time
    pub fn apply(&self, simulator: &mut Simulator) -> Result<f64> {
        let value = self.value_at(simulator.current_time());
        simulator.set_model_parameter(&self.parameter, value)?;
        Ok(value)
    }

    /// Same as [`apply`](Self::apply), between pulls of a run cursor
    pub fn apply_to_run(&self, run: &mut SimulationRun<'_>) -> Result<f64> {
        let value = self.value_at(run.current_time());
        run.set_model_parameter(&self.parameter, value)?;
        Ok(value)
    }
}
