//! Real-world scenario benchmarks.
//!
//! These render whole engine blocks the way a host callback would.

mod voices;

pub use voices::bench_voices;
