// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Structural checks that need no knowledge of concrete models: matrix shapes,
//! positive step sizes, monitor periods compatible with `dt`, surface mappings in
//! range. Model-specific checks (parameter names, noise length vs. state
//! variables) happen when the simulator is built and configured.

use crate::{ConfigError, ConfigResult, MonitorKind, SimulationConfig};

/// Relative tolerance when checking that a monitor period is a multiple of `dt`
pub const PERIOD_TOLERANCE: f64 = 1e-9;

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
    ShapeMismatch { field: String, expected: String, actual: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
            Self::ShapeMismatch {
                field,
                expected,
                actual,
            } => {
                write!(f, "Shape mismatch for {}: expected {}, got {}", field, expected, actual)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &SimulationConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_simulation(config, &mut errors);
    validate_connectivity(config, &mut errors);
    validate_noise(config, &mut errors);
    validate_monitors(config, &mut errors);
    validate_surface(config, &mut errors);
    validate_schedule(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn invalid(errors: &mut Vec<ConfigValidationError>, field: &str, reason: impl Into<String>) {
    errors.push(ConfigValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    });
}

fn validate_simulation(config: &SimulationConfig, errors: &mut Vec<ConfigValidationError>) {
    let sim = &config.simulation;
    if !(sim.dt.is_finite() && sim.dt > 0.0) {
        invalid(errors, "simulation.dt", format!("must be finite and > 0, got {}", sim.dt));
    }
    if !(sim.simulation_length.is_finite() && sim.simulation_length >= 0.0) {
        invalid(
            errors,
            "simulation.simulation_length",
            format!("must be finite and >= 0, got {}", sim.simulation_length),
        );
    }
    if !(sim.transient_length.is_finite() && sim.transient_length >= 0.0) {
        invalid(
            errors,
            "simulation.transient_length",
            format!("must be finite and >= 0, got {}", sim.transient_length),
        );
    }
}

fn validate_square(
    field: &str,
    matrix: &[Vec<f64>],
    n: usize,
    errors: &mut Vec<ConfigValidationError>,
) {
    if matrix.len() != n {
        errors.push(ConfigValidationError::ShapeMismatch {
            field: field.to_string(),
            expected: format!("{} rows", n),
            actual: format!("{} rows", matrix.len()),
        });
        return;
    }
    for (i, row) in matrix.iter().enumerate() {
        if row.len() != n {
            errors.push(ConfigValidationError::ShapeMismatch {
                field: format!("{}[{}]", field, i),
                expected: format!("{} columns", n),
                actual: format!("{} columns", row.len()),
            });
        } else if let Some(v) = row.iter().find(|v| !v.is_finite() || **v < 0.0) {
            invalid(
                errors,
                &format!("{}[{}]", field, i),
                format!("entries must be finite and >= 0, found {}", v),
            );
        }
    }
}

fn validate_connectivity(config: &SimulationConfig, errors: &mut Vec<ConfigValidationError>) {
    let conn = &config.connectivity;
    let n = conn.weights.len();
    if n == 0 {
        errors.push(ConfigValidationError::MissingRequired {
            field: "connectivity.weights".to_string(),
        });
        return;
    }
    validate_square("connectivity.weights", &conn.weights, n, errors);
    // Empty tract lengths mean every edge is instantaneous
    if !conn.tract_lengths.is_empty() {
        validate_square("connectivity.tract_lengths", &conn.tract_lengths, n, errors);
    }

    if !(conn.speed.is_finite() && conn.speed > 0.0) {
        invalid(
            errors,
            "connectivity.speed",
            format!("must be finite and > 0, got {}", conn.speed),
        );
    }
    if !conn.labels.is_empty() && conn.labels.len() != n {
        errors.push(ConfigValidationError::ShapeMismatch {
            field: "connectivity.labels".to_string(),
            expected: format!("{} labels", n),
            actual: format!("{} labels", conn.labels.len()),
        });
    }
}

fn validate_noise(config: &SimulationConfig, errors: &mut Vec<ConfigValidationError>) {
    let noise = &config.noise;
    if let Some(nsig) = &noise.nsig {
        if let Some(v) = nsig.iter().find(|v| !v.is_finite() || **v < 0.0) {
            invalid(errors, "noise.nsig", format!("entries must be finite and >= 0, found {}", v));
        }
    }
    if !(noise.intensity.is_finite() && noise.intensity >= 0.0) {
        invalid(
            errors,
            "noise.intensity",
            format!("must be finite and >= 0, got {}", noise.intensity),
        );
    }
}

fn validate_monitors(config: &SimulationConfig, errors: &mut Vec<ConfigValidationError>) {
    let dt = config.simulation.dt;
    for (i, monitor) in config.monitors.iter().enumerate() {
        let field = format!("monitors[{}].period", i);
        if monitor.kind == MonitorKind::Raw {
            continue;
        }
        let Some(period) = monitor.period else {
            errors.push(ConfigValidationError::MissingRequired { field });
            continue;
        };
        if !(period.is_finite() && period > 0.0) {
            invalid(errors, &field, format!("must be finite and > 0, got {}", period));
            continue;
        }
        if dt.is_finite() && dt > 0.0 {
            let ratio = period / dt;
            let istep = ratio.round();
            if istep < 1.0 || (ratio - istep).abs() > PERIOD_TOLERANCE * ratio.max(1.0) {
                invalid(
                    errors,
                    &field,
                    format!("{} is not a positive integer multiple of dt = {}", period, dt),
                );
            }
        }
    }
}

fn validate_surface(config: &SimulationConfig, errors: &mut Vec<ConfigValidationError>) {
    let Some(surface) = &config.surface else {
        return;
    };
    if surface.vertices.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "surface.vertices".to_string(),
        });
    }
    if surface.region_mapping.len() != surface.vertices.len() {
        errors.push(ConfigValidationError::ShapeMismatch {
            field: "surface.region_mapping".to_string(),
            expected: format!("{} entries", surface.vertices.len()),
            actual: format!("{} entries", surface.region_mapping.len()),
        });
    }
    let regions = config.connectivity.weights.len();
    if let Some(r) = surface.region_mapping.iter().find(|&&r| r >= regions) {
        invalid(
            errors,
            "surface.region_mapping",
            format!("region {} out of range for {} regions", r, regions),
        );
    }
    if !surface.coupling_strength.is_finite() {
        invalid(errors, "surface.coupling_strength", "must be finite");
    }
    if let Some(lc) = &surface.local_connectivity {
        if !(lc.cutoff.is_finite() && lc.cutoff > 0.0) {
            invalid(
                errors,
                "surface.local_connectivity.cutoff",
                format!("must be finite and > 0, got {}", lc.cutoff),
            );
        }
    }
}

fn validate_schedule(config: &SimulationConfig, errors: &mut Vec<ConfigValidationError>) {
    if let Some(schedule) = &config.schedule {
        if schedule.parameter.is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: "schedule.parameter".to_string(),
            });
        }
    }
}
