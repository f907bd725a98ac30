// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Local Dynamics Models
//!
//! A model owns the right-hand side `dx/dt = f(x, c)` evaluated independently at
//! every node and mode, plus its state-variable metadata and run-time parameters.
//!
//! ## Adding a New Model
//!
//! 1. Create `src/models/your_model.rs`
//! 2. Implement `ModelParameters` for its parameter block and `Model` for the model
//! 3. Add tests
//! 4. Export in `mod.rs`

pub mod generic_2d_oscillator;
pub mod linear;
pub mod traits;

pub use generic_2d_oscillator::{Generic2dOscillator, Generic2dOscillatorParameters};
pub use linear::{LinearModel, LinearParameters};
pub use traits::{Model, ModelParameters};
