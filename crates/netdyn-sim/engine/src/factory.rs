// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Config-driven construction
//!
//! Maps a validated [`SimulationConfig`] onto concrete models, couplings,
//! integrators, monitors and surfaces. Parameter names are checked here; noise
//! length against the model and monitor periods against `dt` are checked again
//! by `Simulator::configure()`.

use crate::connectivity::Connectivity;
use crate::error::{ConfigurationError, Result};
use crate::monitors::{Monitor, Raw, SubSample, TemporalAverage};
use crate::schedule::ParameterSchedule;
use crate::simulator::{InitialConditions, Simulator, SimulatorOptions};
use crate::surface::{LocalConnectivity, Surface};
use ndarray::{Array2, Array3};
use netdyn_config::{
    CouplingKind, EquationConfig, InitialConditionsKind, IntegratorScheme, ModelKind,
    MonitorKind, SimulationConfig,
};
use netdyn_dynamics::{
    AdditiveNoise, Coupling, Difference, DynamicsError, Equation, EulerDeterministic,
    EulerStochastic, Generic2dOscillator, HeunDeterministic, HeunStochastic, Integrator,
    Linear, LinearModel, Model, Sigmoidal,
};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// A simulator plus the run plan described by the same configuration
#[derive(Debug)]
pub struct BuiltSimulation {
    pub simulator: Simulator,
    pub schedule: Option<ParameterSchedule>,
    /// Recorded run length (ms)
    pub simulation_length: f64,
    /// Discarded run length before recording (ms)
    pub transient_length: f64,
}

/// Build an unconfigured simulator from `config`.
pub fn build_simulator(config: &SimulationConfig) -> Result<BuiltSimulation> {
    netdyn_config::validate_config(config)
        .map_err(|e| ConfigurationError::InvalidConfig(e.to_string()))?;

    let model = build_model(config)?;
    let nvar = model.number_of_state_variables();
    let connectivity = build_connectivity(config)?;
    let coupling = build_coupling(config)?;
    let integrator = build_integrator(config, nvar)?;
    let monitors = build_monitors(config);

    let surface = build_surface(config)?;
    let nodes = surface
        .as_ref()
        .map_or(connectivity.number_of_nodes(), Surface::number_of_vertices);
    let initial_conditions = build_initial_conditions(config, model.as_ref(), nodes)?;

    let schedule = match &config.schedule {
        Some(schedule) => Some(ParameterSchedule::new(
            schedule.parameter.clone(),
            build_equation(&schedule.equation)?,
        )?),
        None => None,
    };
    if let Some(schedule) = &schedule {
        if model.parameter(schedule.parameter()).is_none() {
            return Err(DynamicsError::UnknownParameter {
                model: model.name(),
                name: schedule.parameter().to_string(),
            }
            .into());
        }
    }

    info!(
        "[FACTORY] Built {} / {} / {} with {} node(s){}",
        model.name(),
        coupling.name(),
        integrator.scheme_name(),
        nodes,
        if surface.is_some() { " on surface" } else { "" }
    );

    let options = SimulatorOptions {
        slow_step_threshold: Duration::from_millis(config.simulation.slow_step_warn_ms),
    };

    let mut simulator = Simulator::new(model, connectivity, coupling, integrator, monitors)
        .with_initial_conditions(initial_conditions)
        .with_options(options);
    if let Some(surface) = surface {
        simulator = simulator.with_surface(surface);
    }

    Ok(BuiltSimulation {
        simulator,
        schedule,
        simulation_length: config.simulation.simulation_length,
        transient_length: config.simulation.transient_length,
    })
}

pub fn build_model(config: &SimulationConfig) -> Result<Box<dyn Model>> {
    let mut model: Box<dyn Model> = match config.model.kind {
        ModelKind::Linear => Box::new(LinearModel::default()),
        ModelKind::Generic2dOscillator => Box::new(Generic2dOscillator::new()),
    };
    for (name, &value) in &config.model.parameters {
        model.set_parameter(name, value)?;
    }
    debug!(
        "[FACTORY] Model {} with {} parameter override(s)",
        model.name(),
        config.model.parameters.len()
    );
    Ok(model)
}

pub fn build_coupling(config: &SimulationConfig) -> Result<Box<dyn Coupling>> {
    let params = &config.coupling.parameters;
    let coupling: Box<dyn Coupling> = match config.coupling.kind {
        CouplingKind::Linear => {
            let mut c = Linear::default();
            assign(params, "Linear", |name, value| {
                let slot = match name {
                    "a" => &mut c.a,
                    "b" => &mut c.b,
                    _ => return None,
                };
                *slot = value;
                Some(())
            })?;
            Box::new(c)
        }
        CouplingKind::Sigmoidal => {
            let mut c = Sigmoidal::default();
            assign(params, "Sigmoidal", |name, value| {
                let slot = match name {
                    "cmin" => &mut c.cmin,
                    "cmax" => &mut c.cmax,
                    "midpoint" => &mut c.midpoint,
                    "a" => &mut c.a,
                    "sigma" => &mut c.sigma,
                    _ => return None,
                };
                *slot = value;
                Some(())
            })?;
            Box::new(c)
        }
        CouplingKind::Difference => {
            let mut c = Difference::default();
            assign(params, "Difference", |name, value| {
                if name != "a" {
                    return None;
                }
                c.a = value;
                Some(())
            })?;
            Box::new(c)
        }
    };
    coupling.validate()?;
    Ok(coupling)
}

/// Apply every `(name, value)` through `set`; `None` from `set` means unknown
fn assign<F>(params: &BTreeMap<String, f64>, owner: &'static str, mut set: F) -> Result<()>
where
    F: FnMut(&str, f64) -> Option<()>,
{
    for (name, &value) in params {
        if set(name, value).is_none() {
            return Err(DynamicsError::UnknownParameter {
                model: owner,
                name: name.clone(),
            }
            .into());
        }
    }
    Ok(())
}

pub fn build_connectivity(config: &SimulationConfig) -> Result<Connectivity> {
    let section = &config.connectivity;
    // Without tract lengths every edge is instantaneous
    let n = section.weights.len();
    let zero_lengths;
    let tract_lengths = if section.tract_lengths.is_empty() {
        zero_lengths = vec![vec![0.0; n]; n];
        &zero_lengths
    } else {
        &section.tract_lengths
    };
    let connectivity = Connectivity::from_rows(&section.weights, tract_lengths, section.speed)?;
    let connectivity = if section.labels.is_empty() {
        connectivity
    } else {
        connectivity.with_labels(section.labels.clone())?
    };
    Ok(connectivity)
}

pub fn build_integrator(config: &SimulationConfig, nvar: usize) -> Result<Box<dyn Integrator>> {
    let dt = config.simulation.dt;
    let scheme = config.integrator.scheme;
    let noise = || -> Result<AdditiveNoise> {
        let noise = match &config.noise.nsig {
            Some(nsig) => AdditiveNoise::new(nsig.clone(), config.noise.seed)?,
            None => AdditiveNoise::uniform(config.noise.intensity, nvar, config.noise.seed)?,
        };
        Ok(noise)
    };
    let integrator: Box<dyn Integrator> = match scheme {
        IntegratorScheme::EulerDeterministic => Box::new(EulerDeterministic::new(dt)),
        IntegratorScheme::HeunDeterministic => Box::new(HeunDeterministic::new(dt)),
        IntegratorScheme::EulerStochastic => Box::new(EulerStochastic::new(dt, noise()?)),
        IntegratorScheme::HeunStochastic => Box::new(HeunStochastic::new(dt, noise()?)),
    };
    Ok(integrator)
}

/// One monitor per entry; a plain `Raw` when none are listed
pub fn build_monitors(config: &SimulationConfig) -> Vec<Box<dyn Monitor>> {
    if config.monitors.is_empty() {
        return vec![Box::new(Raw::new())];
    }
    config
        .monitors
        .iter()
        .map(|m| -> Box<dyn Monitor> {
            let voi = m.variables_of_interest.clone();
            // Missing periods are rejected by config validation; fall back to dt here
            let period = m.period.unwrap_or(config.simulation.dt);
            match (m.kind, voi) {
                (MonitorKind::Raw, None) => Box::new(Raw::new()),
                (MonitorKind::Raw, Some(voi)) => Box::new(Raw::with_variables_of_interest(voi)),
                (MonitorKind::SubSample, None) => Box::new(SubSample::new(period)),
                (MonitorKind::SubSample, Some(voi)) => {
                    Box::new(SubSample::new(period).with_variables_of_interest(voi))
                }
                (MonitorKind::TemporalAverage, None) => Box::new(TemporalAverage::new(period)),
                (MonitorKind::TemporalAverage, Some(voi)) => {
                    Box::new(TemporalAverage::new(period).with_variables_of_interest(voi))
                }
            }
        })
        .collect()
}

/// Equation from `kind` + named parameters, starting from that kind's defaults
pub fn build_equation(config: &EquationConfig) -> Result<Equation> {
    let mut equation = match config.kind.as_str() {
        "gaussian" => Equation::gaussian(),
        "mexican_hat" => Equation::mexican_hat(),
        "linear" => Equation::Linear { a: 1.0, b: 0.0 },
        other => {
            return Err(DynamicsError::InvalidEquation(format!("unknown equation kind '{}'", other)).into());
        }
    };
    for (name, &value) in &config.parameters {
        let slot = match (&mut equation, name.as_str()) {
            (Equation::Gaussian { amp, .. }, "amp") => amp,
            (Equation::Gaussian { sigma, .. }, "sigma") => sigma,
            (Equation::Gaussian { midpoint, .. }, "midpoint") => midpoint,
            (Equation::Gaussian { offset, .. }, "offset") => offset,
            (Equation::MexicanHat { amp1, .. }, "amp1") => amp1,
            (Equation::MexicanHat { sigma1, .. }, "sigma1") => sigma1,
            (Equation::MexicanHat { amp2, .. }, "amp2") => amp2,
            (Equation::MexicanHat { sigma2, .. }, "sigma2") => sigma2,
            (Equation::MexicanHat { midpoint, .. }, "midpoint") => midpoint,
            (Equation::Linear { a, .. }, "a") => a,
            (Equation::Linear { b, .. }, "b") => b,
            _ => {
                return Err(DynamicsError::InvalidEquation(format!(
                    "unknown parameter '{}' for {} equation",
                    name, config.kind
                ))
                .into());
            }
        };
        *slot = value;
    }
    equation.validate()?;
    Ok(equation)
}

pub fn build_surface(config: &SimulationConfig) -> Result<Option<Surface>> {
    let Some(section) = &config.surface else {
        return Ok(None);
    };
    let flat: Vec<f64> = section.vertices.iter().flatten().copied().collect();
    let vertices = Array2::from_shape_vec((section.vertices.len(), 3), flat)
        .map_err(|e| ConfigurationError::InvalidSurface(e.to_string()))?;
    let local_connectivity = match &section.local_connectivity {
        Some(lc) => Some(LocalConnectivity::new(lc.cutoff, build_equation(&lc.kernel)?)?),
        None => None,
    };
    let surface = Surface::new(
        vertices,
        section.region_mapping.clone(),
        local_connectivity,
        section.coupling_strength,
    )?;
    Ok(Some(surface))
}

pub fn build_initial_conditions(
    config: &SimulationConfig,
    model: &dyn Model,
    nodes: usize,
) -> Result<InitialConditions> {
    let section = &config.initial_conditions;
    match section.kind {
        InitialConditionsKind::Random => Ok(InitialConditions::Random { seed: section.seed }),
        InitialConditionsKind::Constant => {
            let nvar = model.number_of_state_variables();
            if section.values.len() != nvar {
                return Err(ConfigurationError::InitialConditionsShape {
                    expected: vec![nvar],
                    actual: vec![section.values.len()],
                }
                .into());
            }
            let modes = model.number_of_modes();
            let state = Array3::from_shape_fn((nvar, nodes, modes), |(v, _, _)| section.values[v]);
            Ok(InitialConditions::State(state))
        }
    }
}
