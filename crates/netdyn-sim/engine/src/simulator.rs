// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Simulator
//!
//! Owns the clock and drives the per-step pipeline:
//!
//! ```text
//! delayed input (History) → coupling (+ local surface term)
//!     → Integrator (Model::dfun per stage, optional noise)
//!     → finite check → History push → Monitors
//! ```
//!
//! ## Lifecycle
//! `Unconfigured → Configured → Running → Stopped | Exhausted`, plus `Faulted`
//! after a numeric error. Any mutable access to a bound component returns the
//! simulator to `Unconfigured`; stepping then fails until `configure()` runs.
//!
//! ## Stepping
//! `run(length)` hands out a [`SimulationRun`] cursor that performs exactly one
//! raw step per `next()`. A step either commits fully (state, History, clock,
//! monitors) or, on a non-finite state, commits nothing.

use crate::connectivity::Connectivity;
use crate::error::{ConfigurationError, NumericError, Result, SimulationError};
use crate::history::History;
use crate::monitors::{Monitor, Sample};
use crate::network_coupling::NetworkCoupling;
use crate::surface::{BoundSurface, Surface};
use ndarray::{Array3, Array4, ArrayView3, Axis, CowArray, Ix3};
use netdyn_dynamics::{find_non_finite, Coupling, Integrator, Model, StateShape};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Runtime-gated per-step tracing.
/// Enable with:
/// - NETDYN_TRACE_STEPS=1
/// Optional filters:
/// - NETDYN_TRACE_NODE=<usize node index> (single node)
struct StepTraceCfg {
    enabled: bool,
    node_filter: Option<usize>,
}

fn step_trace_cfg() -> &'static StepTraceCfg {
    static CFG: OnceLock<StepTraceCfg> = OnceLock::new();
    CFG.get_or_init(|| {
        let enabled = std::env::var("NETDYN_TRACE_STEPS")
            .ok()
            .as_deref()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let node_filter = std::env::var("NETDYN_TRACE_NODE")
            .ok()
            .and_then(|v| v.parse().ok());

        StepTraceCfg {
            enabled,
            node_filter,
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulatorState {
    Unconfigured,
    Configured,
    Running,
    Stopped,
    Exhausted,
    Faulted,
}

/// How the state and History are seeded at `configure()`/`reset()`
#[derive(Debug, Clone, PartialEq)]
pub enum InitialConditions {
    /// Uniform within the model's `state_variable_range`; every History slot
    /// holds the same draw
    Random { seed: u64 },
    /// Explicit `(state variables, nodes, modes)`; every History slot holds it
    State(Array3<f64>),
    /// Explicit trajectory `(time, state variables, nodes, modes)`, oldest first.
    /// At least as long as the History horizon; the last entry is the current
    /// state.
    History(Array4<f64>),
}

impl Default for InitialConditions {
    fn default() -> Self {
        InitialConditions::Random { seed: 42 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorOptions {
    /// Warn when a single step takes longer than this
    pub slow_step_threshold: Duration,
}

impl Default for SimulatorOptions {
    fn default() -> Self {
        Self {
            slow_step_threshold: Duration::from_millis(20),
        }
    }
}

/// Result of one monitor for one step
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorOutput {
    /// Sample time when `data` is present, step time otherwise
    pub time: f64,
    pub data: Option<Array3<f64>>,
}

/// Result of one raw step; one `MonitorOutput` per monitor in registration order
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub step: u64,
    pub time: f64,
    pub outputs: Vec<MonitorOutput>,
}

/// Everything `configure()` derives
#[derive(Debug)]
struct Runtime {
    dt: f64,
    shape: StateShape,
    current: Array3<f64>,
    history: History,
    network: NetworkCoupling,
    surface: Option<BoundSurface>,
    coupling_variables: Vec<usize>,
    current_step: u64,
}

impl Runtime {
    fn time(&self) -> f64 {
        self.current_step as f64 * self.dt
    }

    /// State as stored in History: region averages on a surface, the state itself otherwise
    fn history_view<'a>(&self, state: ArrayView3<'a, f64>) -> CowArray<'a, f64, Ix3> {
        match &self.surface {
            Some(surface) => CowArray::from(surface.region_average(state)),
            None => CowArray::from(state),
        }
    }
}

#[derive(Debug)]
pub struct Simulator {
    model: Box<dyn Model>,
    connectivity: Connectivity,
    coupling: Box<dyn Coupling>,
    integrator: Box<dyn Integrator>,
    monitors: Vec<Box<dyn Monitor>>,
    surface: Option<Surface>,
    initial_conditions: InitialConditions,
    options: SimulatorOptions,
    state: SimulatorState,
    runtime: Option<Runtime>,
}

impl Simulator {
    pub fn new(
        model: Box<dyn Model>,
        connectivity: Connectivity,
        coupling: Box<dyn Coupling>,
        integrator: Box<dyn Integrator>,
        monitors: Vec<Box<dyn Monitor>>,
    ) -> Self {
        Self {
            model,
            connectivity,
            coupling,
            integrator,
            monitors,
            surface: None,
            initial_conditions: InitialConditions::default(),
            options: SimulatorOptions::default(),
            state: SimulatorState::Unconfigured,
            runtime: None,
        }
    }

    pub fn with_surface(mut self, surface: Surface) -> Self {
        self.surface = Some(surface);
        self.invalidate();
        self
    }

    pub fn with_initial_conditions(mut self, initial_conditions: InitialConditions) -> Self {
        self.initial_conditions = initial_conditions;
        self.invalidate();
        self
    }

    pub fn with_options(mut self, options: SimulatorOptions) -> Self {
        self.options = options;
        self
    }

    fn invalidate(&mut self) {
        self.state = SimulatorState::Unconfigured;
    }

    // ---------------------------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------------------------

    pub fn state(&self) -> SimulatorState {
        self.state
    }

    pub fn model(&self) -> &dyn Model {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> &mut dyn Model {
        self.invalidate();
        self.model.as_mut()
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    pub fn set_connectivity(&mut self, connectivity: Connectivity) {
        self.connectivity = connectivity;
        self.invalidate();
    }

    pub fn coupling(&self) -> &dyn Coupling {
        self.coupling.as_ref()
    }

    pub fn coupling_mut(&mut self) -> &mut dyn Coupling {
        self.invalidate();
        self.coupling.as_mut()
    }

    pub fn integrator(&self) -> &dyn Integrator {
        self.integrator.as_ref()
    }

    pub fn integrator_mut(&mut self) -> &mut dyn Integrator {
        self.invalidate();
        self.integrator.as_mut()
    }

    pub fn monitors(&self) -> &[Box<dyn Monitor>] {
        &self.monitors
    }

    pub fn monitors_mut(&mut self) -> &mut Vec<Box<dyn Monitor>> {
        self.invalidate();
        &mut self.monitors
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn set_initial_conditions(&mut self, initial_conditions: InitialConditions) {
        self.initial_conditions = initial_conditions;
        self.invalidate();
    }

    pub fn options(&self) -> &SimulatorOptions {
        &self.options
    }

    pub fn dt(&self) -> f64 {
        self.integrator.dt()
    }

    /// Raw steps taken since the last `configure()`/`reset()`
    pub fn current_step(&self) -> u64 {
        self.runtime.as_ref().map_or(0, |rt| rt.current_step)
    }

    pub fn current_time(&self) -> f64 {
        self.runtime.as_ref().map_or(0.0, Runtime::time)
    }

    pub fn current_state(&self) -> Option<ArrayView3<'_, f64>> {
        self.runtime.as_ref().map(|rt| rt.current.view())
    }

    pub fn history(&self) -> Option<&History> {
        self.runtime.as_ref().map(|rt| &rt.history)
    }

    /// History horizon `K = max delay + 1`, once configured
    pub fn horizon(&self) -> Option<usize> {
        self.history().map(History::horizon)
    }

    /// Shape of the simulated state, once configured
    pub fn state_shape(&self) -> Option<StateShape> {
        self.runtime.as_ref().map(|rt| rt.shape)
    }

    /// Update a model parameter; effective from the next `dfun` call.
    /// Does not require reconfiguration.
    pub fn set_model_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        self.model
            .set_parameter(name, value)
            .map_err(SimulationError::Parameter)?;
        debug!(
            "[SIMULATOR] Model parameter {}={} at step {}",
            name,
            value,
            self.current_step()
        );
        Ok(())
    }

    // ---------------------------------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------------------------------

    /// Validate all components and allocate History and monitor buffers.
    ///
    /// Rewinds the clock and resets noise streams. Calling it twice is the same
    /// as calling it once.
    pub fn configure(&mut self) -> Result<()> {
        self.state = SimulatorState::Unconfigured;
        self.runtime = None;

        let runtime = self.build_runtime()?;

        info!(
            "[SIMULATOR] Configured {} + {} + {}: {} nodes, {} state variables, dt={}, history horizon={}, {} monitor(s)",
            self.model.name(),
            self.coupling.name(),
            self.integrator.scheme_name(),
            runtime.shape.nodes,
            runtime.shape.variables,
            runtime.dt,
            runtime.history.horizon(),
            self.monitors.len()
        );

        self.runtime = Some(runtime);
        self.state = SimulatorState::Configured;
        Ok(())
    }

    fn build_runtime(&mut self) -> Result<Runtime> {
        self.model.validate()?;
        self.model.validate_coupling_variables()?;
        self.model.validate_boundaries()?;
        self.coupling.validate()?;

        let nvar = self.model.number_of_state_variables();
        let modes = self.model.number_of_modes();
        self.integrator.configure(nvar)?;
        self.integrator.reset();
        let dt = self.integrator.dt();

        let coupling_variables = self.model.coupling_variables().to_vec();
        let network = NetworkCoupling::new(&self.connectivity, dt, &coupling_variables)?;

        let regions = self.connectivity.number_of_nodes();
        let surface = match &self.surface {
            Some(surface) => Some(surface.bind(regions)?),
            None => None,
        };
        let nodes = self
            .surface
            .as_ref()
            .map_or(regions, Surface::number_of_vertices);

        let shape = StateShape::new(nvar, nodes, modes);
        let history_shape = StateShape::new(nvar, regions, modes);
        let mut history = History::new(network.required_horizon(), history_shape)?;

        let current = self.seed_state(shape, &mut history, surface.as_ref())?;

        for monitor in self.monitors.iter_mut() {
            monitor.configure(dt, shape)?;
            monitor.reset();
        }

        Ok(Runtime {
            dt,
            shape,
            current,
            history,
            network,
            surface,
            coupling_variables,
            current_step: 0,
        })
    }

    /// Produce the initial state and fill `history` from the initial conditions
    fn seed_state(
        &self,
        shape: StateShape,
        history: &mut History,
        surface: Option<&BoundSurface>,
    ) -> Result<Array3<f64>> {
        let current = match &self.initial_conditions {
            InitialConditions::Random { seed } => {
                let state = random_state(self.model.as_ref(), shape, *seed);
                history.fill(to_history(surface, state.view()).view())?;
                state
            }
            InitialConditions::State(state) => {
                if StateShape::of(&state.view()) != shape {
                    return Err(ConfigurationError::InitialConditionsShape {
                        expected: shape.as_array().to_vec(),
                        actual: state.shape().to_vec(),
                    }
                    .into());
                }
                history.fill(to_history(surface, state.view()).view())?;
                state.clone()
            }
            InitialConditions::History(trajectory) => {
                let (length, variables, nodes, modes) = trajectory.dim();
                let horizon = history.horizon();
                if length < horizon || StateShape::new(variables, nodes, modes) != shape {
                    return Err(ConfigurationError::InitialConditionsShape {
                        expected: vec![horizon, shape.variables, shape.nodes, shape.modes],
                        actual: trajectory.shape().to_vec(),
                    }
                    .into());
                }
                let mut reduced = Array4::zeros((
                    horizon,
                    history.shape().variables,
                    history.shape().nodes,
                    history.shape().modes,
                ));
                for (slot, entry) in trajectory
                    .axis_iter(Axis(0))
                    .skip(length - horizon)
                    .enumerate()
                {
                    reduced
                        .index_axis_mut(Axis(0), slot)
                        .assign(&to_history(surface, entry));
                }
                history.fill_from(reduced.view())?;
                trajectory.index_axis(Axis(0), length - 1).to_owned()
            }
        };

        if find_non_finite(current.view()).is_some() {
            return Err(ConfigurationError::NonFiniteInitialConditions.into());
        }
        Ok(current)
    }

    /// Rewind the clock, refill History from the initial conditions and reset
    /// monitors and noise. Requires a configured simulator.
    pub fn reset(&mut self) -> Result<()> {
        match self.state {
            SimulatorState::Unconfigured => {
                return Err(ConfigurationError::NotConfigured.into());
            }
            SimulatorState::Faulted => return self.configure(),
            _ => {}
        }
        let Some(mut runtime) = self.runtime.take() else {
            return Err(ConfigurationError::NotConfigured.into());
        };

        runtime.history.reset();
        let seeded = self.seed_state(runtime.shape, &mut runtime.history, runtime.surface.as_ref());
        match seeded {
            Ok(current) => runtime.current = current,
            Err(err) => {
                self.state = SimulatorState::Unconfigured;
                return Err(err);
            }
        }
        runtime.current_step = 0;
        self.integrator.reset();
        for monitor in self.monitors.iter_mut() {
            monitor.reset();
        }
        self.runtime = Some(runtime);
        self.state = SimulatorState::Configured;
        debug!("[SIMULATOR] Reset to step 0");
        Ok(())
    }

    // ---------------------------------------------------------------------------------------
    // Stepping
    // ---------------------------------------------------------------------------------------

    /// Lazily step for `simulation_length` time units from the current clock.
    ///
    /// Configuration problems (unconfigured, faulted, bad length) surface as the
    /// first item of the returned cursor.
    pub fn run(&mut self, simulation_length: f64) -> SimulationRun<'_> {
        let dt = self.dt();
        let total = steps_for_length(simulation_length, dt);
        let pending_error = match (self.state, total) {
            (SimulatorState::Unconfigured, _) => Some(ConfigurationError::NotConfigured),
            (SimulatorState::Faulted, _) => Some(ConfigurationError::Faulted),
            (_, None) => Some(ConfigurationError::InvalidSimulationLength {
                length: simulation_length,
            }),
            _ => None,
        };
        let total = total.unwrap_or(0);

        if pending_error.is_none() {
            debug!(
                "[SIMULATOR] Run of {} steps starting at step {} (t={})",
                total,
                self.current_step(),
                self.current_time()
            );
        }

        SimulationRun {
            simulator: self,
            total,
            taken: 0,
            pending_error,
            fused: false,
        }
    }

    fn step(&mut self) -> Result<StepOutput> {
        let step_start = Instant::now();
        let Some(rt) = self.runtime.as_mut() else {
            return Err(ConfigurationError::NotConfigured.into());
        };

        let current = rt.current.view();
        let regional = rt.history_view(current);

        let mut coupling = rt
            .network
            .compute(self.coupling.as_ref(), regional.view(), &rt.history);
        if let Some(surface) = &rt.surface {
            coupling = surface.broadcast(coupling.view());
            surface.add_local_coupling(&mut coupling, current, &rt.coupling_variables);
        }

        let next = self
            .integrator
            .step(self.model.as_ref(), current, coupling.view());

        let step = rt.current_step + 1;
        if let Some((variable, node, mode)) = find_non_finite(next.view()) {
            warn!(
                "[SIMULATOR] Non-finite state at step {}: variable {}, node {}, mode {}",
                step, variable, node, mode
            );
            return Err(NumericError::NonFiniteState {
                step,
                variable,
                node,
                mode,
            }
            .into());
        }

        // Commit
        let pushed = rt.history_view(next.view()).into_owned();
        rt.history.push(pushed.view())?;
        rt.current = next;
        rt.current_step = step;
        let time = rt.time();

        let cfg = step_trace_cfg();
        if cfg.enabled {
            let nodes = rt.shape.nodes;
            for node in (0..nodes).filter(|n| cfg.node_filter.map_or(true, |f| f == *n)) {
                trace!(
                    "[STEP] step={} t={} node={} state={:?}",
                    step,
                    time,
                    node,
                    rt.current.index_axis(Axis(1), node).iter().collect::<Vec<_>>()
                );
            }
        }

        let state_view = rt.current.view();
        let outputs = self
            .monitors
            .iter_mut()
            .map(|monitor| {
                monitor.consume_raw_step(step, time, state_view);
                match monitor.maybe_emit() {
                    Some(Sample { time, data }) => {
                        debug!("[MONITOR] {} sample at t={}", monitor.name(), time);
                        MonitorOutput {
                            time,
                            data: Some(data),
                        }
                    }
                    None => MonitorOutput { time, data: None },
                }
            })
            .collect();

        let elapsed = step_start.elapsed();
        if elapsed > self.options.slow_step_threshold {
            warn!(
                "[SIMULATOR] Slow step {}: {:.2}ms for {} nodes",
                step,
                elapsed.as_secs_f64() * 1000.0,
                rt.shape.nodes
            );
        }

        Ok(StepOutput {
            step,
            time,
            outputs,
        })
    }
}

/// Number of steps covering `length`; lengths within floating error of a whole
/// number of steps do not round up.
pub fn steps_for_length(length: f64, dt: f64) -> Option<u64> {
    if !(length.is_finite() && length >= 0.0 && dt.is_finite() && dt > 0.0) {
        return None;
    }
    let ratio = length / dt;
    let nearest = ratio.round();
    let steps = if (ratio - nearest).abs() <= crate::monitors::PERIOD_TOLERANCE * ratio.max(1.0) {
        nearest
    } else {
        ratio.ceil()
    };
    Some(steps as u64)
}

fn to_history(surface: Option<&BoundSurface>, state: ArrayView3<f64>) -> Array3<f64> {
    match surface {
        Some(surface) => surface.region_average(state),
        None => state.to_owned(),
    }
}

fn random_state(model: &dyn Model, shape: StateShape, seed: u64) -> Array3<f64> {
    let ranges = model.state_variable_range();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut state = shape.zeros();
    for (v, mut plane) in state.axis_iter_mut(Axis(0)).enumerate() {
        let (lo, hi) = ranges.get(v).copied().unwrap_or((0.0, 0.0));
        for value in plane.iter_mut() {
            *value = if hi > lo { rng.gen_range(lo..hi) } else { lo };
        }
    }
    state
}

/// Lazy stepping cursor returned by [`Simulator::run`].
///
/// Borrows the simulator mutably for its lifetime. After an error it yields
/// `None`. Dropping it early leaves the simulator `Stopped`.
pub struct SimulationRun<'a> {
    simulator: &'a mut Simulator,
    total: u64,
    taken: u64,
    pending_error: Option<ConfigurationError>,
    fused: bool,
}

impl<'a> SimulationRun<'a> {
    /// Steps this run will take in total
    pub fn total_steps(&self) -> u64 {
        self.total
    }

    pub fn remaining_steps(&self) -> u64 {
        self.total - self.taken
    }

    pub fn current_step(&self) -> u64 {
        self.simulator.current_step()
    }

    pub fn current_time(&self) -> f64 {
        self.simulator.current_time()
    }

    pub fn simulator(&self) -> &Simulator {
        &*self.simulator
    }

    /// Update a model parameter between pulls
    pub fn set_model_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        self.simulator.set_model_parameter(name, value)
    }
}

impl<'a> Iterator for SimulationRun<'a> {
    type Item = Result<StepOutput>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        if let Some(err) = self.pending_error.take() {
            self.fused = true;
            return Some(Err(err.into()));
        }
        if self.taken >= self.total {
            self.fused = true;
            self.simulator.state = SimulatorState::Exhausted;
            debug!(
                "[SIMULATOR] Run exhausted at step {}",
                self.simulator.current_step()
            );
            return None;
        }

        self.simulator.state = SimulatorState::Running;
        match self.simulator.step() {
            Ok(output) => {
                self.taken += 1;
                Some(Ok(output))
            }
            Err(err) => {
                self.fused = true;
                self.simulator.state = SimulatorState::Faulted;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.fused {
            return (0, Some(0));
        }
        let remaining = (self.total - self.taken) as usize;
        let extra = usize::from(self.pending_error.is_some());
        (0, Some(remaining + extra))
    }
}

impl Drop for SimulationRun<'_> {
    fn drop(&mut self) {
        match self.simulator.state {
            SimulatorState::Running if self.taken >= self.total => {
                self.simulator.state = SimulatorState::Exhausted;
            }
            SimulatorState::Running => {
                debug!(
                    "[SIMULATOR] Run stopped early at step {} ({} of {} steps)",
                    self.simulator.current_step(),
                    self.taken,
                    self.total
                );
                self.simulator.state = SimulatorState::Stopped;
            }
            _ => {}
        }
    }
}
