//! Benchmarks for the instrument model and whole-engine rendering.
//!
//! Run with: cargo bench
//!
//! One block must render well inside its real-time deadline.
//!
//! Reference timing at 44.1kHz sample rate:
//!   - 64 samples  = 1.45ms deadline
//!   - 128 samples = 2.90ms deadline
//!   - 256 samples = 5.80ms deadline
//!   - 512 samples = 11.61ms deadline
//!
//! Benchmark groups:
//!   - dsp/*        Partial tables and amplitude envelopes
//!   - scenarios/*  Full engine blocks at several polyphony levels

use criterion::{criterion_group, criterion_main};

mod dsp;
mod scenarios;

/// Common buffer sizes used in audio applications.
pub const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

criterion_group!(
    benches,
    // Instrument model
    dsp::bench_partials,
    dsp::bench_envelope,
    // Whole engine
    scenarios::bench_voices,
);
criterion_main!(benches);
