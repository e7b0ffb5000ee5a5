/*
Strike Noise from a Chaotic Map
===============================

The thunk of a hammer or the scrape of a pick is not tonal. Instead of white
noise we iterate the Tinkerbell map, a two-variable quadratic map whose orbit
wanders around a bounded attractor:

    x' = x^2 - y^2 + a x + b y
    y' = 2 x y + c x + d y

    a = 0.9, b = -0.6013, c = 2.0, d = 0.5, start (-0.72, -0.64)

Its output is broadband but has more structure than a PRNG, which reads as a
woody knock rather than hiss. The map is stepped twice per audio sample and x
is shaped by a fast 1/t decay:

    noise = x * 0.2 / (t * ATTACK)

The larger ATTACK, the shorter the knock. After TRANSIENT_LENGTH seconds the
map is no longer evaluated at all.
*/

const A: f64 = 0.9;
const B: f64 = -0.6013;
const C: f64 = 2.0;
const D: f64 = 0.5;
const START: (f64, f64) = (-0.72, -0.64);
const STEPS_PER_SAMPLE: usize = 2;

/// Higher values give a shorter, harder knock.
pub const ATTACK: f64 = 3_000.0;
/// Seconds after the strike during which the noise is generated.
pub const TRANSIENT_LENGTH: f64 = 0.5;
const NOISE_GAIN: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TinkerbellMap {
    x: f64,
    y: f64,
}

impl TinkerbellMap {
    pub const fn new() -> Self {
        Self {
            x: START.0,
            y: START.1,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance one audio sample and return the new x.
    pub fn step(&mut self) -> f64 {
        for _ in 0..STEPS_PER_SAMPLE {
            let x = self.x * self.x - self.y * self.y + A * self.x + B * self.y;
            let y = 2.0 * self.x * self.y + C * self.x + D * self.y;
            self.x = x;
            self.y = y;
        }
        // Rounding can in principle throw the orbit off the attractor.
        if !(self.x.is_finite() && self.y.is_finite()) || self.x.abs() > 10.0 {
            self.reset();
        }
        self.x
    }

    pub fn x(&self) -> f64 {
        self.x
    }
}

impl Default for TinkerbellMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Shape a map output into strike noise at note time `t` (seconds, > 0).
#[inline]
pub fn strike_noise(x: f64, t: f64) -> f64 {
    x * NOISE_GAIN / (t * ATTACK)
}

/// True while strike noise should still be generated at note time `t`.
#[inline]
pub fn in_transient(t: f64) -> bool {
    t > 0.0 && t < TRANSIENT_LENGTH
}
