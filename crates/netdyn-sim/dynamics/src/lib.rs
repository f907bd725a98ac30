// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # netdyn Dynamics
//!
//! Everything that happens *at* a node, in one place:
//! - **State**: `(state variables, nodes, modes)` arrays and shape helpers
//! - **Models**: local dynamics (`dfun`), bounds, run-time parameters
//! - **Coupling**: pre/post transforms applied to delayed neighbour states
//! - **Noise**: seedable additive noise streams
//! - **Integrators**: Euler and Heun schemes, deterministic and stochastic
//! - **Equations**: spatial kernels and temporal parameter profiles
//!
//! Nothing in this crate knows about delays, history or monitors; those live in
//! `netdyn-engine`, which composes these pieces into a simulation loop.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod coupling;
pub mod equations;
pub mod error;
pub mod integrators;
pub mod models;
pub mod noise;
pub mod state;

pub use coupling::{Coupling, Difference, Linear, Sigmoidal};
pub use equations::Equation;
pub use error::{DynamicsError, Result};
pub use integrators::{
    EulerDeterministic, EulerStochastic, HeunDeterministic, HeunStochastic, Integrator,
};
pub use models::{Generic2dOscillator, LinearModel, Model, ModelParameters};
pub use noise::AdditiveNoise;
pub use state::{find_non_finite, State, StateShape};
