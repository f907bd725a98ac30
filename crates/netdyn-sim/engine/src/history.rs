// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! History - ring buffer of past network states for delayed reads.
//!
//! Key semantics:
//! - Fixed horizon `K`: the last `K` pushed states are retained; `K = max delay + 1`.
//! - `delayed(node, d)` returns exactly the state pushed `d` pushes ago, `0 <= d < K`.
//!   `d = 0` is the most recent push.
//! - Reads return owned copies; nothing outside this module sees the buffer layout.

use crate::error::HistoryError;
use ndarray::{s, Array2, Array3, Array4, ArrayView3, ArrayView4, Axis};
use netdyn_dynamics::StateShape;

#[derive(Debug, Clone)]
pub struct History {
    /// `(K, state variables, nodes, modes)`
    buffer: Array4<f64>,
    shape: StateShape,
    /// Slot holding the most recent push
    latest: usize,
}

impl History {
    pub fn new(horizon: usize, shape: StateShape) -> Result<Self, HistoryError> {
        if horizon == 0 {
            return Err(HistoryError::InvalidHorizon);
        }
        Ok(Self {
            buffer: Array4::zeros((horizon, shape.variables, shape.nodes, shape.modes)),
            shape,
            latest: 0,
        })
    }

    pub fn horizon(&self) -> usize {
        self.buffer.len_of(Axis(0))
    }

    pub fn shape(&self) -> StateShape {
        self.shape
    }

    fn check_shape(&self, state: &ArrayView3<f64>) -> Result<(), HistoryError> {
        let actual = StateShape::of(state);
        if actual != self.shape {
            return Err(HistoryError::ShapeMismatch {
                expected: self.shape.as_array().to_vec(),
                actual: actual.as_array().to_vec(),
            });
        }
        Ok(())
    }

    #[inline]
    fn slot(&self, steps_ago: usize) -> usize {
        let horizon = self.horizon();
        (self.latest + horizon - steps_ago) % horizon
    }

    fn check_delay(&self, steps_ago: usize) -> Result<(), HistoryError> {
        if steps_ago >= self.horizon() {
            return Err(HistoryError::DelayExceedsHorizon {
                steps_ago,
                horizon: self.horizon(),
            });
        }
        Ok(())
    }

    /// Set every slot to `state`
    pub fn fill(&mut self, state: ArrayView3<f64>) -> Result<(), HistoryError> {
        self.check_shape(&state)?;
        for mut slot in self.buffer.axis_iter_mut(Axis(0)) {
            slot.assign(&state);
        }
        self.latest = 0;
        Ok(())
    }

    /// Load an explicit trajectory ordered oldest to newest along axis 0.
    ///
    /// Only the newest `K` entries are kept. Fewer than `K` entries is an error.
    pub fn fill_from(&mut self, trajectory: ArrayView4<f64>) -> Result<(), HistoryError> {
        let (length, variables, nodes, modes) = trajectory.dim();
        let horizon = self.horizon();
        if length < horizon || StateShape::new(variables, nodes, modes) != self.shape {
            return Err(HistoryError::ShapeMismatch {
                expected: vec![horizon, self.shape.variables, self.shape.nodes, self.shape.modes],
                actual: vec![length, variables, nodes, modes],
            });
        }
        self.buffer
            .assign(&trajectory.slice(s![length - horizon.., .., .., ..]));
        self.latest = horizon - 1;
        Ok(())
    }

    /// Append `state`, overwriting the oldest entry
    pub fn push(&mut self, state: ArrayView3<f64>) -> Result<(), HistoryError> {
        self.check_shape(&state)?;
        self.latest = (self.latest + 1) % self.horizon();
        self.buffer.index_axis_mut(Axis(0), self.latest).assign(&state);
        Ok(())
    }

    /// State of one node `steps_ago` pushes ago, shaped `(state variables, modes)`
    pub fn delayed(&self, node: usize, steps_ago: usize) -> Result<Array2<f64>, HistoryError> {
        self.check_delay(steps_ago)?;
        if node >= self.shape.nodes {
            return Err(HistoryError::NodeOutOfRange {
                node,
                nodes: self.shape.nodes,
            });
        }
        Ok(self
            .buffer
            .slice(s![self.slot(steps_ago), .., node, ..])
            .to_owned())
    }

    /// Full network state `steps_ago` pushes ago
    pub fn delayed_all(&self, steps_ago: usize) -> Result<Array3<f64>, HistoryError> {
        self.check_delay(steps_ago)?;
        Ok(self
            .buffer
            .index_axis(Axis(0), self.slot(steps_ago))
            .to_owned())
    }

    /// Single scalar read for the coupling hot path. Callers guarantee
    /// `steps_ago < horizon()` and in-range indices.
    #[inline]
    pub(crate) fn value(&self, steps_ago: usize, variable: usize, node: usize, mode: usize) -> f64 {
        self.buffer[[self.slot(steps_ago), variable, node, mode]]
    }

    /// Most recent push
    pub fn latest(&self) -> ArrayView3<'_, f64> {
        self.buffer.index_axis(Axis(0), self.latest)
    }

    /// Zero every slot
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.latest = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(value: f64) -> Array3<f64> {
        Array3::from_elem((2, 3, 1), value)
    }

    #[test]
    fn test_new_rejects_zero_horizon() {
        assert_eq!(
            History::new(0, StateShape::new(1, 1, 1)).unwrap_err(),
            HistoryError::InvalidHorizon
        );
    }

    #[test]
    fn test_push_and_delayed() {
        let mut history = History::new(3, StateShape::new(2, 3, 1)).unwrap();
        history.fill(state(0.0).view()).unwrap();
        for k in 1..=5 {
            history.push(state(k as f64).view()).unwrap();
        }
        assert_eq!(history.delayed(0, 0).unwrap()[[0, 0]], 5.0);
        assert_eq!(history.delayed(1, 1).unwrap()[[1, 0]], 4.0);
        assert_eq!(history.delayed_all(2).unwrap(), state(3.0));
        assert_eq!(history.latest(), state(5.0).view());
    }

    #[test]
    fn test_delay_beyond_horizon() {
        let history = History::new(2, StateShape::new(2, 3, 1)).unwrap();
        assert_eq!(
            history.delayed(0, 2).unwrap_err(),
            HistoryError::DelayExceedsHorizon {
                steps_ago: 2,
                horizon: 2
            }
        );
        assert!(matches!(
            history.delayed(3, 0),
            Err(HistoryError::NodeOutOfRange { .. })
        ));
    }

    #[test]
    fn test_fill_from_keeps_newest() {
        let mut history = History::new(2, StateShape::new(1, 1, 1)).unwrap();
        let trajectory = Array4::from_shape_vec((3, 1, 1, 1), vec![1.0, 2.0, 3.0]).unwrap();
        history.fill_from(trajectory.view()).unwrap();
        assert_eq!(history.delayed(0, 0).unwrap()[[0, 0]], 3.0);
        assert_eq!(history.delayed(0, 1).unwrap()[[0, 0]], 2.0);

        let short = Array4::zeros((1, 1, 1, 1));
        assert!(history.fill_from(short.view()).is_err());
    }

    #[test]
    fn test_push_shape_checked() {
        let mut history = History::new(2, StateShape::new(2, 3, 1)).unwrap();
        let wrong = Array3::zeros((2, 4, 1));
        assert!(matches!(
            history.push(wrong.view()),
            Err(HistoryError::ShapeMismatch { .. })
        ));
    }
}
