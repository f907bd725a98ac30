// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # netdyn - Network Dynamics Simulation
//!
//! Time-stepping simulation of coupled dynamical systems distributed over a
//! weighted network with finite conduction delays. Nodes are brain regions, or
//! cortical-surface vertices when a surface is attached.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! netdyn = "0.0.1-beta.18"  # Default: engine + config + observability
//! ```
//!
//! ## Feature Flags
//!
//! - **`full`** (default): all components below
//! - **`engine`**: connectivity, history, monitors and the simulator
//! - **`config`**: TOML configuration loading and validation
//! - **`observability`**: logging initialization and debug flags
//! - **`file-logging`**: rolling log files under timestamped run folders
//!
//! The dynamics crate (models, coupling functions, integrators, noise) is
//! always available as [`dynamics`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use netdyn::prelude::*;
//! use ndarray::{array, Array2};
//!
//! let connectivity = Connectivity::new(array![[0.0, 1.0], [1.0, 0.0]], Array2::zeros((2, 2)), 3.0)?;
//! let mut sim = Simulator::new(
//!     Box::new(Generic2dOscillator::new()),
//!     connectivity,
//!     Box::new(Linear::default()),
//!     Box::new(HeunDeterministic::new(0.1)),
//!     vec![Box::new(Raw::new()), Box::new(TemporalAverage::new(1.0))],
//! );
//! sim.configure()?;
//!
//! for output in sim.run(100.0) {
//!     let output = output?;
//!     if let Some(averaged) = &output.outputs[1].data {
//!         println!("t={} mean V={}", output.outputs[1].time, averaged.mean().unwrap_or(0.0));
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: netdyn-dynamics                            │
//! │  (Model, Coupling, Integrator, Noise, Equation)         │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Engine: netdyn-engine                                  │
//! │  (Connectivity, History, Surface, Monitor, Simulator)   │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Edges: netdyn-config, netdyn-observability, netdyn-run │
//! │  (TOML config, logging, command-line runner)            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export foundation
pub use netdyn_dynamics as dynamics;

// Re-export engine
#[cfg(feature = "engine")]
pub use netdyn_engine as engine;

// Re-export infrastructure
#[cfg(feature = "config")]
pub use netdyn_config as config;

#[cfg(feature = "observability")]
pub use netdyn_observability as observability;

#[cfg(all(feature = "engine", feature = "config"))]
pub mod runner;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::dynamics::{
        AdditiveNoise, Coupling, Difference, Equation, EulerDeterministic, EulerStochastic,
        Generic2dOscillator, HeunDeterministic, HeunStochastic, Integrator, Linear, LinearModel,
        Model, Sigmoidal, StateShape,
    };

    #[cfg(feature = "engine")]
    pub use crate::engine::{
        build_simulator, Connectivity, InitialConditions, LocalConnectivity, Monitor,
        MonitorOutput, ParameterSchedule, Raw, SimulationError, SimulationRun, Simulator,
        SimulatorOptions, SimulatorState, StepOutput, SubSample, Surface, TemporalAverage,
    };

    #[cfg(feature = "config")]
    pub use crate::config::{load_config, validate_config, SimulationConfig};
}
