// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! # netdyn Engine
//!
//! Delay-aware stepping of coupled dynamical systems over a weighted network.
//!
//! ## Pipeline (per raw step)
//! 1. Delayed neighbour states from [`History`] through [`Connectivity`] delays
//! 2. Network coupling (plus local surface coupling when a [`Surface`] is bound)
//! 3. Integration of the model's `dfun`, optionally with noise
//! 4. History update, then every [`Monitor`] sees the new state
//!
//! ## Architecture
//! - Single-threaded, pull-driven: [`Simulator::run`] returns a lazy cursor
//! - Rayon across targets for large networks; per-target sums stay sequential
//! - Connectivity matrices shared through `Arc`

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod connectivity;
pub mod error;
pub mod factory;
pub mod history;
pub mod monitors;
pub mod network_coupling;
pub mod schedule;
pub mod simulator;
pub mod surface;

pub use connectivity::Connectivity;
pub use error::{ConfigurationError, HistoryError, NumericError, Result, SimulationError};
pub use factory::{build_simulator, BuiltSimulation};
pub use history::History;
pub use monitors::{Monitor, Raw, Sample, SubSample, TemporalAverage};
pub use network_coupling::NetworkCoupling;
pub use schedule::ParameterSchedule;
pub use simulator::{
    InitialConditions, MonitorOutput, SimulationRun, Simulator, SimulatorOptions, SimulatorState,
    StepOutput,
};
pub use surface::{BoundSurface, LocalConnectivity, SparseMatrix, Surface};

// Re-export dynamics so downstream code needs a single dependency
pub use netdyn_dynamics as dynamics;
