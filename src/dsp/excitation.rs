/*
Excitation Pulse
================

When the hammer hits, energy does not appear in the string instantly: the
contact lasts a few milliseconds and the force rises and falls smoothly. We
model that contact as a Gaussian force pulse of fixed duration d, centred at
d/2:

    force(t) = exp(-(t - d/2)^2 / (0.03 d^2)) * strength

      force
        |        ___
        |      /     \
        |     /       \
        |  __/         \__
        +--+-----+-----+--> t
           0    d/2    d

With the 0.03 width constant the curve is down to exp(-8.3) ~ 2.4e-4 at both
ends, so switching the pulse on and off produces no audible step.

Per sample the injected energy is

    dE = dt * force(t) * INJECTION_GAIN

which integrates to about 0.77 * strength over the whole pulse.
*/

/// Length of the strike, in seconds.
pub const EXCITATION_DURATION: f64 = 0.005;
/// Scales the force curve into stored energy.
pub const INJECTION_GAIN: f64 = 500.0;
const GAUSSIAN_WIDTH: f64 = 0.03;

/// The energy-injection pulse of the most recent strike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExcitationPulse {
    pub time_since_strike: f64,
    pub duration: f64,
    pub strength: f64,
}

impl ExcitationPulse {
    /// A pulse that has already finished.
    pub const fn idle() -> Self {
        Self {
            time_since_strike: 0.0,
            duration: 0.0,
            strength: 0.0,
        }
    }

    /// Start a new strike with `strength` in 0..=1.
    pub fn strike(strength: f64) -> Self {
        Self {
            time_since_strike: 0.0,
            duration: EXCITATION_DURATION,
            strength: strength.clamp(0.0, 1.0),
        }
    }

    pub fn is_active(&self) -> bool {
        self.time_since_strike < self.duration
    }

    /// Normalised force at the current position, in `0..=strength`.
    pub fn force(&self) -> f64 {
        if !self.is_active() {
            return 0.0;
        }
        let d = self.duration;
        let centred = self.time_since_strike - d / 2.0;
        (-(centred * centred) / (d * d * GAUSSIAN_WIDTH)).exp() * self.strength
    }

    /// Energy to add for one sample of length `dt`.
    pub fn energy_delta(&self, dt: f64) -> f64 {
        dt * self.force() * INJECTION_GAIN
    }

    pub fn advance(&mut self, dt: f64) {
        self.time_since_strike += dt;
    }
}

impl Default for ExcitationPulse {
    fn default() -> Self {
        Self::idle()
    }
}
