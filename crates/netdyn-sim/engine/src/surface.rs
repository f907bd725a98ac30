// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Cortical Surface
//!
//! With a surface attached, simulation nodes are mesh vertices rather than
//! regions. Every vertex belongs to one region of the connectivity:
//!
//! - long-range coupling is computed between regions, on region-averaged
//!   delayed states, then broadcast to each vertex of the target region;
//! - local coupling adds a distance-limited kernel over neighbouring vertices:
//!
//! ```text
//! c_local[k, i, m] = coupling_strength · Σ_n LC[i, n] · x[v, n, m]
//! LC[i, n]         = kernel(|p_i - p_n|)    for 0 < |p_i - p_n| <= cutoff
//! ```
//!
//! `c_local` is added to the long-range input, and the model sees only the sum.
//! Any input gain the model applies to `c` (e.g. `gamma` in the 2D oscillator)
//! therefore scales the local term too.

use crate::error::ConfigurationError;
use ndarray::{Array2, Array3, ArrayView3, Axis};
use netdyn_dynamics::Equation;

/// Distance-limited kernel over vertex positions
#[derive(Debug, Clone, PartialEq)]
pub struct LocalConnectivity {
    pub cutoff: f64,
    pub kernel: Equation,
}

impl LocalConnectivity {
    pub fn new(cutoff: f64, kernel: Equation) -> Result<Self, ConfigurationError> {
        if !(cutoff.is_finite() && cutoff > 0.0) {
            return Err(ConfigurationError::InvalidSurface(format!(
                "local connectivity cutoff must be finite and > 0, got {}",
                cutoff
            )));
        }
        kernel.validate()?;
        Ok(Self { cutoff, kernel })
    }

    /// Evaluate the kernel over Euclidean distances between `vertices` (`n x 3`).
    ///
    /// Self-connections are excluded.
    pub fn build(&self, vertices: &Array2<f64>) -> SparseMatrix {
        let n = vertices.nrows();
        let cutoff_sq = self.cutoff * self.cutoff;
        let rows = (0..n)
            .map(|i| {
                let p = vertices.row(i);
                (0..n)
                    .filter(|&k| k != i)
                    .filter_map(|k| {
                        let q = vertices.row(k);
                        let dist_sq: f64 = p.iter().zip(q.iter()).map(|(a, b)| (a - b) * (a - b)).sum();
                        if dist_sq > cutoff_sq {
                            return None;
                        }
                        let value = self.kernel.evaluate(dist_sq.sqrt());
                        (value != 0.0).then_some((k, value))
                    })
                    .collect()
            })
            .collect();
        SparseMatrix { rows }
    }
}

/// Row-compressed sparse matrix
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseMatrix {
    rows: Vec<Vec<(usize, f64)>>,
}

impl SparseMatrix {
    pub fn number_of_rows(&self) -> usize {
        self.rows.len()
    }

    /// Stored (non-zero) entries
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn row(&self, i: usize) -> &[(usize, f64)] {
        &self.rows[i]
    }

    pub fn get(&self, i: usize, k: usize) -> f64 {
        self.rows[i]
            .iter()
            .find(|(col, _)| *col == k)
            .map_or(0.0, |(_, v)| *v)
    }
}

/// Vertex mesh mapped onto connectivity regions
#[derive(Debug, Clone)]
pub struct Surface {
    /// `n_vertices x 3`
    pub vertices: Array2<f64>,
    /// Region index per vertex
    pub region_mapping: Vec<usize>,
    pub local_connectivity: Option<LocalConnectivity>,
    pub coupling_strength: f64,
}

impl Surface {
    pub fn new(
        vertices: Array2<f64>,
        region_mapping: Vec<usize>,
        local_connectivity: Option<LocalConnectivity>,
        coupling_strength: f64,
    ) -> Result<Self, ConfigurationError> {
        if vertices.ncols() != 3 {
            return Err(ConfigurationError::InvalidSurface(format!(
                "vertices must be n x 3, got {} columns",
                vertices.ncols()
            )));
        }
        if vertices.nrows() == 0 {
            return Err(ConfigurationError::InvalidSurface("surface has no vertices".to_string()));
        }
        if vertices.iter().any(|v| !v.is_finite()) {
            return Err(ConfigurationError::InvalidSurface(
                "vertex coordinates must be finite".to_string(),
            ));
        }
        if region_mapping.len() != vertices.nrows() {
            return Err(ConfigurationError::InvalidSurface(format!(
                "region mapping has {} entries for {} vertices",
                region_mapping.len(),
                vertices.nrows()
            )));
        }
        if !coupling_strength.is_finite() {
            return Err(ConfigurationError::InvalidSurface(format!(
                "coupling strength must be finite, got {}",
                coupling_strength
            )));
        }
        Ok(Self {
            vertices,
            region_mapping,
            local_connectivity,
            coupling_strength,
        })
    }

    pub fn number_of_vertices(&self) -> usize {
        self.vertices.nrows()
    }

    /// Validate the mapping against `regions` and precompute the local kernel
    pub fn bind(&self, regions: usize) -> Result<BoundSurface, ConfigurationError> {
        let mut counts = vec![0usize; regions];
        for (vertex, &region) in self.region_mapping.iter().enumerate() {
            if region >= regions {
                return Err(ConfigurationError::InvalidSurface(format!(
                    "vertex {} maps to region {} but connectivity has {} regions",
                    vertex, region, regions
                )));
            }
            counts[region] += 1;
        }
        if let Some(region) = counts.iter().position(|&c| c == 0) {
            return Err(ConfigurationError::InvalidSurface(format!(
                "region {} has no vertices",
                region
            )));
        }
        let local = self
            .local_connectivity
            .as_ref()
            .map(|lc| lc.build(&self.vertices));
        Ok(BoundSurface {
            region_mapping: self.region_mapping.clone(),
            counts,
            local,
            coupling_strength: self.coupling_strength,
        })
    }
}

/// Surface resolved against a connectivity; used while stepping
#[derive(Debug, Clone)]
pub struct BoundSurface {
    region_mapping: Vec<usize>,
    counts: Vec<usize>,
    local: Option<SparseMatrix>,
    coupling_strength: f64,
}

impl BoundSurface {
    pub fn number_of_regions(&self) -> usize {
        self.counts.len()
    }

    pub fn local_matrix(&self) -> Option<&SparseMatrix> {
        self.local.as_ref()
    }

    /// Mean over each region's vertices: `(vars, vertices, modes)` to `(vars, regions, modes)`
    pub fn region_average(&self, state: ArrayView3<f64>) -> Array3<f64> {
        let (vars, _, modes) = state.dim();
        let mut out = Array3::zeros((vars, self.counts.len(), modes));
        for (vertex, &region) in self.region_mapping.iter().enumerate() {
            let mut target = out.index_axis_mut(Axis(1), region);
            target += &state.index_axis(Axis(1), vertex);
        }
        for (region, &count) in self.counts.iter().enumerate() {
            out.index_axis_mut(Axis(1), region)
                .mapv_inplace(|x| x / count as f64);
        }
        out
    }

    /// Copy each region's values to its vertices
    pub fn broadcast(&self, regional: ArrayView3<f64>) -> Array3<f64> {
        let (vars, _, modes) = regional.dim();
        let mut out = Array3::zeros((vars, self.region_mapping.len(), modes));
        for (vertex, &region) in self.region_mapping.iter().enumerate() {
            out.index_axis_mut(Axis(1), vertex)
                .assign(&regional.index_axis(Axis(1), region));
        }
        out
    }

    /// Add `coupling_strength · LC · x[v]` for each coupling variable into `coupling`,
    /// on top of the long-range input already there
    pub fn add_local_coupling(
        &self,
        coupling: &mut Array3<f64>,
        state: ArrayView3<f64>,
        coupling_variables: &[usize],
    ) {
        let Some(lc) = &self.local else {
            return;
        };
        if self.coupling_strength == 0.0 {
            return;
        }
        let modes = state.len_of(Axis(2));
        for (k, &v) in coupling_variables.iter().enumerate() {
            for i in 0..lc.number_of_rows() {
                for m in 0..modes {
                    let sum: f64 = lc.row(i).iter().map(|&(n, w)| w * state[[v, n, m]]).sum();
                    coupling[[k, i, m]] += self.coupling_strength * sum;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn line_surface(lc: Option<LocalConnectivity>) -> Surface {
        // four vertices on a line, 1 mm apart; two per region
        let vertices = array![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [3.0, 0.0, 0.0]
        ];
        Surface::new(vertices, vec![0, 0, 1, 1], lc, 0.5).unwrap()
    }

    #[test]
    fn test_local_connectivity_cutoff() {
        let lc = LocalConnectivity::new(1.5, Equation::Linear { a: 0.0, b: 2.0 }).unwrap();
        let matrix = lc.build(&line_surface(None).vertices);
        // neighbours within 1.5 mm only, no self-connections
        assert_eq!(matrix.nnz(), 6);
        assert_eq!(matrix.get(0, 1), 2.0);
        assert_eq!(matrix.get(0, 0), 0.0);
        assert_eq!(matrix.get(0, 2), 0.0);
    }

    #[test]
    fn test_region_average_and_broadcast() {
        let bound = line_surface(None).bind(2).unwrap();
        let state = array![[[1.0], [3.0], [10.0], [20.0]]];
        let regional = bound.region_average(state.view());
        assert_eq!(regional, array![[[2.0], [15.0]]]);
        let back = bound.broadcast(regional.view());
        assert_eq!(back, array![[[2.0], [2.0], [15.0], [15.0]]]);
    }

    #[test]
    fn test_add_local_coupling() {
        let lc = LocalConnectivity::new(1.5, Equation::Linear { a: 0.0, b: 1.0 }).unwrap();
        let bound = line_surface(Some(lc)).bind(2).unwrap();
        let state = array![[[1.0], [2.0], [3.0], [4.0]]];
        let mut coupling = Array3::zeros((1, 4, 1));
        bound.add_local_coupling(&mut coupling, state.view(), &[0]);
        // vertex 1: 0.5 · (x0 + x2) = 2.0
        assert_eq!(coupling[[0, 1, 0]], 2.0);
        // vertex 3: 0.5 · x2 = 1.5
        assert_eq!(coupling[[0, 3, 0]], 1.5);
    }

    #[test]
    fn test_local_term_adds_to_long_range_input() {
        let lc = LocalConnectivity::new(1.5, Equation::Linear { a: 0.0, b: 1.0 }).unwrap();
        let bound = line_surface(Some(lc)).bind(2).unwrap();
        let state = array![[[1.0], [2.0], [3.0], [4.0]]];
        let mut coupling = Array3::from_elem((1, 4, 1), 10.0);
        bound.add_local_coupling(&mut coupling, state.view(), &[0]);
        assert_eq!(coupling[[0, 1, 0]], 12.0);
        assert_eq!(coupling[[0, 3, 0]], 11.5);
    }

    #[test]
    fn test_bind_rejects_empty_region_and_bad_mapping() {
        let surface = line_surface(None);
        assert!(surface.bind(3).is_err());
        assert!(surface.bind(1).is_err());
        assert!(Surface::new(Array2::zeros((2, 2)), vec![0, 0], None, 0.0).is_err());
    }
}
