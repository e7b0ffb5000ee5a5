//! Low-level pieces of the string model.
//!
//! Everything in here is plain math over `f64`: no voice bookkeeping, no
//! shared state. The synth layer owns the state these functions advance, and
//! the render layer calls the per-sample ones from parallel work units, so
//! nothing in this module may touch a shared generator or allocate per sample.

/// Per-partial amplitude as a function of frequency, index and note time.
pub mod envelope;
/// Gaussian energy-injection pulse fired at note-on.
pub mod excitation;
/// Inharmonic two-string partial set generation.
pub mod partials;
/// Seeded pseudorandom streams.
pub mod random;
/// Moving-average smoothing for controller values.
pub mod smoothing;
/// Spectral tilt and pitch-bend shaping from the instrument terms.
pub mod tilt;
/// Chaotic map used for the percussive strike noise.
pub mod transient;

pub use envelope::partial_amplitude;
pub use excitation::ExcitationPulse;
pub use partials::{Partial, PartialBank, PartialSpec};
