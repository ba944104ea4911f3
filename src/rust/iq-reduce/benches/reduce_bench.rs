// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use iq_reduce::{AcquisitionBuffer, LoopAxis, ReduceOptions, reduce};
use num_complex::Complex;
use std::hint::black_box;

fn create_buffer(n: usize) -> AcquisitionBuffer {
    AcquisitionBuffer::new(
        (0..n)
            .map(|k| Complex::new(k as f64, -(k as f64)))
            .collect(),
    )
}

fn bench_average(c: &mut Criterion) {
    let reps = [10, 100, 1000];

    let mut group = c.benchmark_group("average");

    for &rep_count in &reps {
        let axes = vec![LoopAxis::sweep("expts", 100), LoopAxis::repetitions(rep_count)];
        let raw = vec![create_buffer(100 * rep_count)];
        group.bench_with_input(BenchmarkId::new("reduce", rep_count), &rep_count, |b, _| {
            b.iter(|| black_box(reduce(&raw, &axes, &ReduceOptions::default())));
        });
    }

    group.finish();
}

fn bench_threshold(c: &mut Criterion) {
    let reps = [10, 100, 1000];

    let mut group = c.benchmark_group("threshold");

    for &rep_count in &reps {
        let axes = vec![LoopAxis::sweep("expts", 100), LoopAxis::repetitions(rep_count)];
        let raw = vec![create_buffer(100 * rep_count)];
        let options = ReduceOptions {
            threshold: Some(vec![0.0]),
            angle: Some(vec![0.3]),
            save_subset: None,
            reads_per_rep: None,
        };
        group.bench_with_input(BenchmarkId::new("reduce", rep_count), &rep_count, |b, _| {
            b.iter(|| black_box(reduce(&raw, &axes, &options)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_average, bench_threshold);
criterion_main!(benches);
