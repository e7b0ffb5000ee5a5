//! Spectral tilt and pitch bend.
//!
//! The instrument exposes three polynomial terms and two brightness knobs.
//! Together they form a per-partial gain that leans the spectrum darker the
//! higher a partial sits:
//!
//! ```text
//! x    = f / 20 kHz
//! tilt = 1 / (1 + linear x + squared x^2 + cubic x^3)
//! gain = tilt ^ (1 - brightness)
//! brightness = clamp(brightness_a * velocity + brightness_b, 0, 1)
//! ```
//!
//! All terms are positive, so the gain is positive and never rises with
//! frequency. Multiplying it into the partial envelope keeps that envelope's
//! "first zero ends the loop" property intact.

use super::envelope::MAX_PARTIAL_FREQUENCY;

/// Coarse bend covers +-12 semitones around its centre of 0.5.
pub const COARSE_BEND_SEMITONES: f64 = 24.0;
/// Fine bend covers +-1 semitone around its centre of 0.5.
pub const FINE_BEND_SEMITONES: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralTilt {
    linear: f64,
    squared: f64,
    cubic: f64,
    exponent: f64,
}

impl SpectralTilt {
    pub fn new(
        linear: f64,
        squared: f64,
        cubic: f64,
        brightness_a: f64,
        brightness_b: f64,
        velocity: f64,
    ) -> Self {
        let brightness = (brightness_a * velocity + brightness_b).clamp(0.0, 1.0);
        Self {
            linear: linear.max(0.0),
            squared: squared.max(0.0),
            cubic: cubic.max(0.0),
            exponent: 1.0 - brightness,
        }
    }

    /// A tilt that leaves every partial untouched.
    pub const fn flat() -> Self {
        Self {
            linear: 0.0,
            squared: 0.0,
            cubic: 0.0,
            exponent: 0.0,
        }
    }

    #[inline]
    pub fn gain(&self, frequency: f64) -> f64 {
        if self.exponent == 0.0 {
            return 1.0;
        }
        let x = (frequency / MAX_PARTIAL_FREQUENCY).max(0.0);
        let poly = 1.0 + x * (self.linear + x * (self.squared + x * self.cubic));
        poly.powf(-self.exponent)
    }
}

/// Frequency ratio for the two pitch-bend controls (each 0..=1, centre 0.5).
pub fn pitch_bend_ratio(coarse: f64, fine: f64) -> f64 {
    let semitones = (coarse - 0.5) * COARSE_BEND_SEMITONES + (fine - 0.5) * FINE_BEND_SEMITONES;
    2.0_f64.powf(semitones / 12.0)
}

/// Mod wheel opens up the envelope's velocity brightness term.
#[inline]
pub fn brightened_velocity(velocity: f64, mod_wheel: f64) -> f64 {
    let m = mod_wheel.clamp(0.0, 1.0);
    velocity + m * (1.0 - velocity)
}
