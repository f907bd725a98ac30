// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Long-Range Coupling
//!
//! Evaluates delayed network input for every target node:
//!
//! ```text
//! c[k, i, m] = post( Σ_j W[i, j] · pre(x[v, i, m](t), x[v, j, m](t - D[i, j])) )
//!     where v = coupling_variables[k]
//! ```
//!
//! Edges are stored per target as `(source, weight, delay)` with zero weights
//! dropped. Zero-delay edges read the current state directly.
//!
//! ## Performance
//! Targets are independent, so large networks are split across the Rayon pool.
//! Each target's sum is still accumulated sequentially in source order, keeping
//! results bit-identical to the single-threaded path.

use crate::connectivity::Connectivity;
use crate::error::ConfigurationError;
use crate::history::History;
use ndarray::{Array3, ArrayView3, Axis};
use netdyn_dynamics::Coupling;
use rayon::prelude::*;

/// Below this many targets, the Rayon split costs more than it saves
const PARALLEL_TARGET_THRESHOLD: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Edge {
    source: usize,
    weight: f64,
    delay: usize,
}

#[derive(Debug, Clone)]
pub struct NetworkCoupling {
    /// Incoming edges per target
    edges: Vec<Vec<Edge>>,
    coupling_variables: Vec<usize>,
    max_delay: usize,
    horizon: usize,
}

impl NetworkCoupling {
    pub fn new(
        connectivity: &Connectivity,
        dt: f64,
        coupling_variables: &[usize],
    ) -> Result<Self, ConfigurationError> {
        let delays = connectivity.delays(dt)?;
        let weights = connectivity.weights();
        let n = connectivity.number_of_nodes();

        let edges = (0..n)
            .map(|target| {
                (0..n)
                    .filter(|&source| weights[[target, source]] != 0.0)
                    .map(|source| Edge {
                        source,
                        weight: weights[[target, source]],
                        delay: delays[[target, source]],
                    })
                    .collect()
            })
            .collect();

        let max_delay = delays.iter().copied().max().unwrap_or(0);
        let horizon = max_delay.checked_add(1).ok_or_else(|| {
            ConfigurationError::InvalidConnectivity(format!("delay of {max_delay} steps has no representable horizon"))
        })?;

        Ok(Self {
            edges,
            coupling_variables: coupling_variables.to_vec(),
            max_delay,
            horizon,
        })
    }

    pub fn number_of_nodes(&self) -> usize {
        self.edges.len()
    }

    /// History horizon needed to serve every edge
    pub fn required_horizon(&self) -> usize {
        self.horizon
    }

    pub fn max_delay(&self) -> usize {
        self.max_delay
    }

    /// Coupling input shaped `(coupling variables, nodes, modes)`.
    ///
    /// `current` is the network state at time `t`; `history.latest()` must hold
    /// the same state.
    pub fn compute(
        &self,
        coupling: &dyn Coupling,
        current: ArrayView3<f64>,
        history: &History,
    ) -> Array3<f64> {
        let (_, nodes, modes) = current.dim();
        let ncvar = self.coupling_variables.len();
        let mut out = Array3::zeros((ncvar, nodes, modes));

        let reads_target = coupling.uses_target_state();
        let target_row = |target: usize| -> Vec<f64> {
            let mut row = Vec::with_capacity(ncvar * modes);
            for &v in &self.coupling_variables {
                for m in 0..modes {
                    let x_i = if reads_target { current[[v, target, m]] } else { 0.0 };
                    let mut gx = 0.0;
                    for edge in &self.edges[target] {
                        let x_j = if edge.delay == 0 {
                            current[[v, edge.source, m]]
                        } else {
                            history.value(edge.delay, v, edge.source, m)
                        };
                        gx += edge.weight * coupling.pre(x_i, x_j);
                    }
                    row.push(coupling.post(gx));
                }
            }
            row
        };

        let rows: Vec<Vec<f64>> = if nodes >= PARALLEL_TARGET_THRESHOLD {
            (0..nodes).into_par_iter().map(target_row).collect()
        } else {
            (0..nodes).map(target_row).collect()
        };

        for (target, row) in rows.into_iter().enumerate() {
            let mut column = out.index_axis_mut(Axis(1), target);
            for (value, slot) in row.into_iter().zip(column.iter_mut()) {
                *slot = value;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use netdyn_dynamics::{Difference, Linear, StateShape};

    /// `pre` would leak the target value into the sum if it were supplied
    #[derive(Debug)]
    struct SourcePlusTarget;

    impl Coupling for SourcePlusTarget {
        fn name(&self) -> &'static str {
            "SourcePlusTarget"
        }

        fn pre(&self, x_i: f64, x_j: f64) -> f64 {
            x_i + x_j
        }

        fn post(&self, gx: f64) -> f64 {
            gx
        }

        fn validate(&self) -> netdyn_dynamics::Result<()> {
            Ok(())
        }
    }

    fn chain() -> Connectivity {
        // 0 <- 1 with delay 2, 1 <- 0 with delay 0
        Connectivity::new(
            array![[0.0, 2.0], [0.5, 0.0]],
            array![[0.0, 2.0], [0.0, 0.0]],
            1.0,
        )
        .unwrap()
    }

    #[test]
    fn test_required_horizon() {
        let net = NetworkCoupling::new(&chain(), 1.0, &[0]).unwrap();
        assert_eq!(net.max_delay(), 2);
        assert_eq!(net.required_horizon(), 3);
    }

    #[test]
    fn test_delayed_and_instant_edges() {
        let net = NetworkCoupling::new(&chain(), 1.0, &[0]).unwrap();
        let shape = StateShape::new(1, 2, 1);
        let mut history = History::new(3, shape).unwrap();

        // pushes: t-2 -> [10, 20], t-1 -> [11, 21], t -> [12, 22]
        history.fill(array![[[10.0], [20.0]]].view()).unwrap();
        history.push(array![[[11.0], [21.0]]].view()).unwrap();
        let current = array![[[12.0], [22.0]]];
        history.push(current.view()).unwrap();

        let c = net.compute(&Linear::new(1.0, 0.0), current.view(), &history);
        // node 0: 2 · x_1(t-2) = 40 ; node 1: 0.5 · x_0(t) = 6
        assert_eq!(c[[0, 0, 0]], 40.0);
        assert_eq!(c[[0, 1, 0]], 6.0);
    }

    #[test]
    fn test_zero_weights_zero_coupling() {
        let conn = Connectivity::new(ndarray::Array2::zeros((3, 3)), ndarray::Array2::zeros((3, 3)), 1.0)
            .unwrap();
        let net = NetworkCoupling::new(&conn, 0.1, &[0]).unwrap();
        let current = Array3::from_elem((2, 3, 1), 5.0);
        let mut history = History::new(1, StateShape::new(2, 3, 1)).unwrap();
        history.fill(current.view()).unwrap();
        let c = net.compute(&Linear::default(), current.view(), &history);
        assert!(c.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_difference_uses_target_state() {
        let conn = Connectivity::new(array![[0.0, 1.0], [1.0, 0.0]], ndarray::Array2::zeros((2, 2)), 1.0)
            .unwrap();
        let net = NetworkCoupling::new(&conn, 1.0, &[0]).unwrap();
        let current = array![[[1.0], [4.0]]];
        let mut history = History::new(1, StateShape::new(1, 2, 1)).unwrap();
        history.fill(current.view()).unwrap();
        let c = net.compute(&Difference { a: 1.0 }, current.view(), &history);
        assert_eq!(c[[0, 0, 0]], 3.0);
        assert_eq!(c[[0, 1, 0]], -3.0);
    }

    #[test]
    fn test_target_state_not_supplied_unless_requested() {
        let conn = Connectivity::new(array![[0.0, 1.0], [2.0, 0.0]], ndarray::Array2::zeros((2, 2)), 1.0)
            .unwrap();
        let net = NetworkCoupling::new(&conn, 1.0, &[0]).unwrap();
        let current = array![[[1.0], [4.0]]];
        let mut history = History::new(1, StateShape::new(1, 2, 1)).unwrap();
        history.fill(current.view()).unwrap();
        let c = net.compute(&SourcePlusTarget, current.view(), &history);
        assert_eq!(c[[0, 0, 0]], 4.0);
        assert_eq!(c[[0, 1, 0]], 2.0);
    }

    #[test]
    fn test_rejects_delay_beyond_history_limit() {
        let conn = Connectivity::new(
            array![[0.0, 1.0], [1.0, 0.0]],
            array![[0.0, 1e6], [1e6, 0.0]],
            1e-300,
        )
        .unwrap();
        assert!(matches!(
            NetworkCoupling::new(&conn, 1.0, &[0]),
            Err(ConfigurationError::InvalidConnectivity(_))
        ));
    }

    #[test]
    fn test_parallel_path_matches_sequential_sum() {
        let n = PARALLEL_TARGET_THRESHOLD + 4;
        let weights = ndarray::Array2::from_shape_fn((n, n), |(i, j)| ((i * 7 + j * 3) % 5) as f64 * 0.1);
        let lengths = ndarray::Array2::from_shape_fn((n, n), |(i, j)| ((i + j) % 3) as f64);
        let conn = Connectivity::new(weights.clone(), lengths, 1.0).unwrap();
        let net = NetworkCoupling::new(&conn, 1.0, &[0]).unwrap();

        let current = Array3::from_shape_fn((1, n, 1), |(_, j, _)| j as f64);
        let mut history = History::new(net.required_horizon(), StateShape::new(1, n, 1)).unwrap();
        history.fill(current.view()).unwrap();

        let c = net.compute(&Linear::new(1.0, 0.0), current.view(), &history);
        for i in [0, n / 2, n - 1] {
            let mut expected = 0.0;
            for j in 0..n {
                if weights[[i, j]] != 0.0 {
                    expected += weights[[i, j]] * j as f64;
                }
            }
            assert_eq!(c[[0, i, 0]], expected);
        }
    }
}
