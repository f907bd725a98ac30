// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Structural Connectivity
//!
//! Weighted directed graph over N nodes with per-edge tract lengths.
//!
//! Convention: row `i` is the target, column `j` the source, so `W[i, j]`
//! weights the signal travelling `j → i`.
//!
//! ```text
//! D[i, j] = round(L[i, j] / (speed · dt))      (half away from zero)
//! ```
//!
//! Delays above [`MAX_DELAY_STEPS`] are rejected, since the history buffer
//! holds one full network state per step of delay.
//!
//! Weight and length matrices sit behind `Arc`, so clones are cheap and several
//! simulators can share one connectivity read-only.

use crate::error::ConfigurationError;
use ndarray::Array2;
use std::sync::Arc;

/// Longest edge delay, in integration steps, that a simulation will allocate for
pub const MAX_DELAY_STEPS: usize = 100_000;

#[derive(Debug, Clone)]
pub struct Connectivity {
    weights: Arc<Array2<f64>>,
    tract_lengths: Arc<Array2<f64>>,
    speed: f64,
    labels: Option<Arc<Vec<String>>>,
}

fn check_speed(speed: f64) -> Result<(), ConfigurationError> {
    if speed.is_finite() && speed > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidConductionSpeed { speed })
    }
}

fn check_entries(name: &str, matrix: &Array2<f64>) -> Result<(), ConfigurationError> {
    if let Some(((i, j), v)) = matrix
        .indexed_iter()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        return Err(ConfigurationError::InvalidConnectivity(format!(
            "{}[{}, {}] = {} must be finite and >= 0",
            name, i, j, v
        )));
    }
    Ok(())
}

impl Connectivity {
    pub fn new(
        weights: Array2<f64>,
        tract_lengths: Array2<f64>,
        speed: f64,
    ) -> Result<Self, ConfigurationError> {
        let (rows, cols) = weights.dim();
        if rows != cols {
            return Err(ConfigurationError::InvalidConnectivity(format!(
                "weights must be square, got {}x{}",
                rows, cols
            )));
        }
        if rows == 0 {
            return Err(ConfigurationError::InvalidConnectivity(
                "connectivity must have at least one node".to_string(),
            ));
        }
        if tract_lengths.dim() != weights.dim() {
            let (lr, lc) = tract_lengths.dim();
            return Err(ConfigurationError::InvalidConnectivity(format!(
                "tract lengths are {}x{} but weights are {}x{}",
                lr, lc, rows, cols
            )));
        }
        check_entries("weights", &weights)?;
        check_entries("tract_lengths", &tract_lengths)?;
        check_speed(speed)?;

        Ok(Self {
            weights: Arc::new(weights),
            tract_lengths: Arc::new(tract_lengths),
            speed,
            labels: None,
        })
    }

    /// Build from row-major nested vectors
    pub fn from_rows(
        weights: &[Vec<f64>],
        tract_lengths: &[Vec<f64>],
        speed: f64,
    ) -> Result<Self, ConfigurationError> {
        Self::new(to_array(weights)?, to_array(tract_lengths)?, speed)
    }

    /// Attach one label per node
    pub fn with_labels(mut self, labels: Vec<String>) -> Result<Self, ConfigurationError> {
        if labels.len() != self.number_of_nodes() {
            return Err(ConfigurationError::InvalidConnectivity(format!(
                "{} labels for {} nodes",
                labels.len(),
                self.number_of_nodes()
            )));
        }
        self.labels = Some(Arc::new(labels));
        Ok(self)
    }

    /// Same graph with a different conduction speed, sharing the matrices
    pub fn with_speed(&self, speed: f64) -> Result<Self, ConfigurationError> {
        check_speed(speed)?;
        Ok(Self {
            speed,
            ..self.clone()
        })
    }

    pub fn number_of_nodes(&self) -> usize {
        self.weights.nrows()
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn shared_weights(&self) -> Arc<Array2<f64>> {
        Arc::clone(&self.weights)
    }

    pub fn tract_lengths(&self) -> &Array2<f64> {
        &self.tract_lengths
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref().map(|l| l.as_slice())
    }

    /// Number of non-zero edges
    pub fn number_of_edges(&self) -> usize {
        self.weights.iter().filter(|&&w| w != 0.0).count()
    }

    /// Integer delay per edge, in steps of `dt`
    pub fn delays(&self, dt: f64) -> Result<Array2<usize>, ConfigurationError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ConfigurationError::InvalidStepSize { dt });
        }
        check_speed(self.speed)?;
        let scale = self.speed * dt;
        let n = self.number_of_nodes();
        let mut delays = Array2::zeros((n, n));
        for ((i, j), &length) in self.tract_lengths.indexed_iter() {
            let steps = (length / scale).round().max(0.0);
            if !steps.is_finite() || steps > MAX_DELAY_STEPS as f64 {
                return Err(ConfigurationError::InvalidConnectivity(format!(
                    "delay of edge ({i}, {j}) is {steps} steps, above the maximum of {MAX_DELAY_STEPS} \
                     (length {length}, speed {}, dt {dt})",
                    self.speed
                )));
            }
            delays[[i, j]] = steps as usize;
        }
        Ok(delays)
    }

    /// Largest delay in steps of `dt`
    pub fn max_delay(&self, dt: f64) -> Result<usize, ConfigurationError> {
        Ok(self.delays(dt)?.iter().copied().max().unwrap_or(0))
    }
}

fn to_array(rows: &[Vec<f64>]) -> Result<Array2<f64>, ConfigurationError> {
    let n = rows.len();
    let m = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|row| row.len() != m) {
        return Err(ConfigurationError::InvalidConnectivity(
            "matrix rows have different lengths".to_string(),
        ));
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((n, m), flat)
        .map_err(|e| ConfigurationError::InvalidConnectivity(e.to_string()))
}
