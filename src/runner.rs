// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Config-driven run workflow used by `netdyn-run`
//!
//! Build from configuration, run and discard the transient, then record while
//! applying the optional parameter schedule before every step.

use crate::config::SimulationConfig;
use crate::engine::{build_simulator, Result, Simulator};
use ndarray::Array3;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

/// Outcome of one recorded run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_name: String,
    pub model: String,
    pub integrator: String,
    pub dt: f64,
    pub transient_steps: u64,
    pub recorded_steps: u64,
    pub final_time: f64,
    pub wall_time_ms: f64,
    pub monitors: Vec<MonitorSummary>,
}

/// Sample count and statistics of the last sample of one monitor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorSummary {
    pub name: String,
    pub period: Option<f64>,
    pub samples: u64,
    pub last_time: Option<f64>,
    pub last_mean: Option<f64>,
    pub last_min: Option<f64>,
    pub last_max: Option<f64>,
}

impl MonitorSummary {
    fn new(name: &str, period: Option<f64>) -> Self {
        Self {
            name: name.to_string(),
            period,
            samples: 0,
            last_time: None,
            last_mean: None,
            last_min: None,
            last_max: None,
        }
    }

    fn record(&mut self, time: f64, data: &Array3<f64>) {
        self.samples += 1;
        self.last_time = Some(time);
        self.last_mean = data.mean();
        self.last_min = data.iter().copied().reduce(f64::min);
        self.last_max = data.iter().copied().reduce(f64::max);
    }
}

/// Build, configure and run the simulation described by `config`
pub fn execute(config: &SimulationConfig) -> Result<RunSummary> {
    let started = Instant::now();
    let built = build_simulator(config)?;
    let mut simulator = built.simulator;
    simulator.configure()?;

    let transient_steps = if built.transient_length > 0.0 {
        let steps = advance(&mut simulator, built.transient_length, built.schedule.as_ref(), None)?;
        info!(
            "[RUNNER] Discarded transient of {} steps (t={})",
            steps,
            simulator.current_time()
        );
        steps
    } else {
        0
    };

    let mut monitors: Vec<MonitorSummary> = simulator
        .monitors()
        .iter()
        .map(|m| MonitorSummary::new(m.name(), m.period()))
        .collect();
    let recorded_steps = advance(
        &mut simulator,
        built.simulation_length,
        built.schedule.as_ref(),
        Some(&mut monitors),
    )?;

    let summary = RunSummary {
        run_name: config.system.run_name.clone(),
        model: simulator.model().name().to_string(),
        integrator: simulator.integrator().scheme_name().to_string(),
        dt: simulator.dt(),
        transient_steps,
        recorded_steps,
        final_time: simulator.current_time(),
        wall_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        monitors,
    };
    info!(
        "[RUNNER] Recorded {} steps to t={} in {:.1}ms",
        summary.recorded_steps, summary.final_time, summary.wall_time_ms
    );
    Ok(summary)
}

/// Step for `length`, applying `schedule` before each step and recording
/// emitted samples into `monitors` when given. Returns the number of steps.
fn advance(
    simulator: &mut Simulator,
    length: f64,
    schedule: Option<&crate::engine::ParameterSchedule>,
    mut monitors: Option<&mut Vec<MonitorSummary>>,
) -> Result<u64> {
    let mut run = simulator.run(length);
    let mut steps = 0;
    loop {
        if let Some(schedule) = schedule {
            let value = schedule.apply_to_run(&mut run)?;
            debug!("[RUNNER] {}={} at t={}", schedule.parameter(), value, run.current_time());
        }
        let Some(output) = run.next() else {
            break;
        };
        let output = output?;
        steps += 1;
        if let Some(monitors) = monitors.as_deref_mut() {
            for (summary, sample) in monitors.iter_mut().zip(&output.outputs) {
                if let Some(data) = &sample.data {
                    summary.record(sample.time, data);
                }
            }
        }
    }
    Ok(steps)
}
