//! Benchmarks for partial table generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use dulcimer::dsp::partials::{PartialBank, PartialSpec};

pub fn bench_partials(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/partials");

    for &count in &[10usize, 50, 200] {
        let mut bank = PartialBank::new();
        let mut seed = 0u64;
        group.bench_with_input(BenchmarkId::new("regenerate", count), &count, |b, &count| {
            b.iter(|| {
                seed = seed.wrapping_add(1);
                bank.regenerate(black_box(PartialSpec {
                    frequency: 261.63,
                    inharmonicity: 0.003,
                    num_partials: count,
                    partial_detune: 1.0,
                    string_detune: 1.0004,
                    seed,
                }));
            })
        });
    }

    group.finish();
}
