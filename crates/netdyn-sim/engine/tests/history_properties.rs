// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Property tests for delayed reads from the History ring buffer

use ndarray::Array3;
use netdyn_engine::dynamics::StateShape;
use netdyn_engine::{History, HistoryError};
use proptest::prelude::*;

/// Distinct, recognisable state for push number `n`
fn state_for(shape: StateShape, n: usize) -> Array3<f64> {
    Array3::from_shape_fn(shape.dim(), |(v, i, m)| {
        (n * 1000 + v * 100 + i * 10 + m) as f64
    })
}

proptest! {
    #[test]
    fn delayed_returns_state_pushed_d_steps_ago(
        horizon in 1usize..12,
        pushes in 0usize..40,
        nodes in 1usize..5,
        variables in 1usize..3,
    ) {
        let shape = StateShape::new(variables, nodes, 1);
        let mut history = History::new(horizon, shape).unwrap();
        history.fill(state_for(shape, 0).view()).unwrap();
        for n in 1..=pushes {
            history.push(state_for(shape, n).view()).unwrap();
        }

        for d in 0..horizon {
            // pushes before the first fill read back as the fill state
            let expected = state_for(shape, pushes.saturating_sub(d));
            prop_assert_eq!(history.delayed_all(d).unwrap(), expected.clone());
            for node in 0..nodes {
                let column = expected.index_axis(ndarray::Axis(1), node).to_owned();
                prop_assert_eq!(history.delayed(node, d).unwrap(), column);
            }
        }
    }

    #[test]
    fn delay_at_horizon_is_rejected(horizon in 1usize..12, extra in 0usize..5) {
        let shape = StateShape::new(1, 1, 1);
        let history = History::new(horizon, shape).unwrap();
        prop_assert_eq!(
            history.delayed_all(horizon + extra).unwrap_err(),
            HistoryError::DelayExceedsHorizon { steps_ago: horizon + extra, horizon }
        );
    }
}

#[test]
fn test_fill_from_keeps_newest_entries() {
    let shape = StateShape::new(1, 2, 1);
    let mut trajectory = ndarray::Array4::zeros((5, 1, 2, 1));
    for t in 0..5 {
        trajectory
            .index_axis_mut(ndarray::Axis(0), t)
            .assign(&state_for(shape, t));
    }
    let mut history = History::new(3, shape).unwrap();
    history.fill_from(trajectory.view()).unwrap();

    assert_eq!(history.latest(), state_for(shape, 4));
    assert_eq!(history.delayed_all(2).unwrap(), state_for(shape, 2));

    let mut short = History::new(6, shape).unwrap();
    assert!(short.fill_from(trajectory.view()).is_err());
}
