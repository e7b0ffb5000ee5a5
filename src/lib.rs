pub mod config;
pub mod dsp; // Instrument model: partials, envelopes, excitation
pub mod engine; // Render boundary: event scheduling and block pulls
pub mod error;
pub mod io;
pub mod render; // Parallel map/reduce block synthesis
pub mod synth; // Voice pool, energy lifecycle, shared parameters

pub use config::{EngineConfig, ReleaseConfig, StealPolicy};
pub use engine::Engine;
pub use error::ConfigError;
pub use render::StereoBlock;

pub const MAX_BLOCK_SIZE: usize = 2048;
pub const DEFAULT_BLOCK_SIZE: usize = 256;
pub const DEFAULT_SAMPLE_RATE: f64 = 44_100.0;
pub const NUM_CHANNELS: usize = 2;
