//! Benchmarks for the per-partial amplitude envelope.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use dulcimer::dsp::envelope::partial_amplitude;

use crate::BLOCK_SIZES;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let cutoff = 22_050.0;

    for &size in BLOCK_SIZES {
        // Ten partials of a mid-range note, one evaluation per sample
        group.bench_with_input(BenchmarkId::new("ten_partials", size), &size, |b, &size| {
            b.iter(|| {
                let mut sum = 0.0;
                for n in 0..size {
                    let t = 0.1 + n as f64 / 44_100.0;
                    for i in 1..=10 {
                        sum += partial_amplitude(i, 261.63 * i as f64, t, 0.8, cutoff);
                    }
                }
                black_box(sum)
            })
        });

        // Partials straddling the band edges hit the crossfade path
        group.bench_with_input(BenchmarkId::new("band_edges", size), &size, |b, &size| {
            b.iter(|| {
                let mut sum = 0.0;
                for n in 0..size {
                    let t = 0.01 + n as f64 / 44_100.0;
                    sum += partial_amplitude(4, black_box(2_480.0), t, 0.8, cutoff);
                    sum += partial_amplitude(12, black_box(8_100.0), t, 0.8, cutoff);
                }
                black_box(sum)
            })
        });
    }

    group.finish();
}
