//! Benchmarks for the instrument model.

mod envelope;
mod partials;

pub use envelope::bench_envelope;
pub use partials::bench_partials;
