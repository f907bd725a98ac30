// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Step Throughput Benchmarks
//!
//! Raw steps per second for the generic 2D oscillator on ring-lattice networks
//! of increasing size. The largest sizes cross the threshold where coupling is
//! computed in parallel across targets.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::Array2;
use netdyn_engine::dynamics::{
    AdditiveNoise, Generic2dOscillator, HeunDeterministic, HeunStochastic, Integrator, Linear,
};
use netdyn_engine::{Connectivity, InitialConditions, Raw, Simulator, TemporalAverage};

const DT: f64 = 0.1;
const STEPS: u64 = 100;

/// Each node receives from its `degree` successors, tract lengths 1-10 mm
fn ring_connectivity(nodes: usize, degree: usize) -> Connectivity {
    let mut weights = Array2::zeros((nodes, nodes));
    let mut lengths = Array2::zeros((nodes, nodes));
    for target in 0..nodes {
        for k in 1..=degree.min(nodes.saturating_sub(1)) {
            let source = (target + k) % nodes;
            weights[[target, source]] = 1.0 / degree as f64;
            lengths[[target, source]] = 1.0 + (k % 10) as f64;
        }
    }
    Connectivity::new(weights, lengths, 3.0).unwrap()
}

fn simulator(nodes: usize, integrator: Box<dyn Integrator>) -> Simulator {
    let mut sim = Simulator::new(
        Box::new(Generic2dOscillator::new()),
        ring_connectivity(nodes, 8),
        Box::new(Linear::default()),
        integrator,
        vec![Box::new(Raw::new()), Box::new(TemporalAverage::new(1.0))],
    )
    .with_initial_conditions(InitialConditions::Random { seed: 42 });
    sim.configure().unwrap();
    sim
}

fn bench_deterministic(c: &mut Criterion) {
    let mut group = c.benchmark_group("heun_deterministic");
    for &nodes in &[16usize, 76, 512] {
        group.throughput(Throughput::Elements(STEPS * nodes as u64));
        group.bench_with_input(BenchmarkId::from_parameter(nodes), &nodes, |b, &nodes| {
            let mut sim = simulator(nodes, Box::new(HeunDeterministic::new(DT)));
            b.iter(|| {
                for output in sim.run(STEPS as f64 * DT) {
                    black_box(output.unwrap());
                }
            });
        });
    }
    group.finish();
}

fn bench_stochastic(c: &mut Criterion) {
    let mut group = c.benchmark_group("heun_stochastic");
    for &nodes in &[16usize, 76, 512] {
        group.throughput(Throughput::Elements(STEPS * nodes as u64));
        group.bench_with_input(BenchmarkId::from_parameter(nodes), &nodes, |b, &nodes| {
            let noise = AdditiveNoise::uniform(0.001, 2, 7).unwrap();
            let mut sim = simulator(nodes, Box::new(HeunStochastic::new(DT, noise)));
            b.iter(|| {
                for output in sim.run(STEPS as f64 * DT) {
                    black_box(output.unwrap());
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_deterministic, bench_stochastic);
criterion_main!(benches);
