// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Network state arrays
//!
//! A network state is a dense `f64` array shaped `(state variables, nodes, modes)`.
//! Only the model interprets the first and last axes; everything else moves the
//! array around as an opaque block.

use crate::error::{DynamicsError, Result};
use ndarray::{Array3, ArrayView3};
use serde::{Deserialize, Serialize};

/// Full-network state: `(state variables, nodes, modes)`
pub type State = Array3<f64>;

/// Dimensions of a network state array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateShape {
    pub variables: usize,
    pub nodes: usize,
    pub modes: usize,
}

impl StateShape {
    pub fn new(variables: usize, nodes: usize, modes: usize) -> Self {
        Self {
            variables,
            nodes,
            modes,
        }
    }

    /// Shape of an existing array
    pub fn of(state: &ArrayView3<f64>) -> Self {
        let (variables, nodes, modes) = state.dim();
        Self::new(variables, nodes, modes)
    }

    pub fn dim(&self) -> (usize, usize, usize) {
        (self.variables, self.nodes, self.modes)
    }

    pub fn as_array(&self) -> [usize; 3] {
        [self.variables, self.nodes, self.modes]
    }

    /// Number of scalars in one state
    pub fn len(&self) -> usize {
        self.variables * self.nodes * self.modes
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn zeros(&self) -> State {
        Array3::zeros(self.dim())
    }

    /// Same shape with a different number of variables (e.g. coupling variables only)
    pub fn with_variables(&self, variables: usize) -> Self {
        Self::new(variables, self.nodes, self.modes)
    }

    /// Fail unless `state` has exactly this shape
    pub fn check(&self, state: &ArrayView3<f64>) -> Result<()> {
        let actual = StateShape::of(state);
        if actual != *self {
            return Err(DynamicsError::ShapeMismatch {
                expected: self.as_array(),
                actual: actual.as_array(),
            });
        }
        Ok(())
    }
}

/// Locate the first non-finite entry as `(variable, node, mode)`.
pub fn find_non_finite(state: ArrayView3<f64>) -> Option<(usize, usize, usize)> {
    state
        .indexed_iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_check() {
        let shape = StateShape::new(2, 3, 1);
        let state = shape.zeros();
        assert!(shape.check(&state.view()).is_ok());

        let other = StateShape::new(2, 4, 1).zeros();
        let err = shape.check(&other.view()).unwrap_err();
        assert_eq!(
            err,
            DynamicsError::ShapeMismatch {
                expected: [2, 3, 1],
                actual: [2, 4, 1]
            }
        );
    }

    #[test]
    fn test_find_non_finite() {
        let mut state = StateShape::new(2, 3, 1).zeros();
        assert_eq!(find_non_finite(state.view()), None);

        state[[1, 2, 0]] = f64::NAN;
        state[[1, 1, 0]] = f64::INFINITY;
        assert_eq!(find_non_finite(state.view()), Some((1, 1, 0)));
    }
}
