/*
Partial Amplitude Envelope
==========================

A struck string does not decay uniformly. High partials die within tens of
milliseconds, low ones ring for seconds, and a soft strike barely excites the
top of the spectrum at all. Rather than give every partial its own ADSR we use
one closed-form amplitude per partial, evaluated from its frequency f, its
index i, the note time t and the velocity v:

    n = i + 1

    f < 2500 Hz        A = 4/n / (t + 0.5/n) * n^-1/2 * n^-1 * (1 - (1-v) f/2500)
    2500 .. 8000 Hz    A = 2/n / (t + 0.5/n) * n^-2 * (1 - t f/5000) * (1 - (1-v) f/8000)
    8000 .. 20000 Hz   A = (1 / (n^3 (t + 0.0001)) - 1e-5) * (1 - t f/3000)
    above              silent

The 1/(t + c) factor is the hyperbolic decay; the (1 - t f/k) factors make the
upper bands die out linearly and faster the higher they sit; the (1 - (1-v) f/k)
factors darken soft strikes.

      A
      |\
      | \___   low band: long hyperbolic tail
      |  \  ---____
      |   \ mid      --------____
      |    \__ high               ------
      +--------------------------------------> t

Within a band every term shrinks as n grows, and the upper bands reach zero
first. The synthesis loop relies on that: the first partial that comes out at
zero ends the loop for that sample. Both strings of a pair use the envelope
of the first string's frequency.


Crossfades at the Band Edges
----------------------------

The three branches do not meet where they hand over (at 2500 Hz a bright
second partial would jump by almost 3x). A partial sliding across a boundary
under pitch bend would click. Each boundary therefore gets a narrow linear
crossfade, +-5% of the edge frequency, between the two neighbouring branches
(each clamped at zero first). Outside those bands the formulas above apply
unchanged.
*/

pub const LOW_BAND_EDGE: f64 = 2_500.0;
pub const MID_BAND_EDGE: f64 = 8_000.0;
/// Partials at or above this frequency are never synthesized.
pub const MAX_PARTIAL_FREQUENCY: f64 = 20_000.0;
/// Half-width of the crossfade around each band edge, relative to the edge.
pub const CROSSFADE_WIDTH: f64 = 0.05;

#[inline]
fn low_band(n: f64, t: f64, f: f64, v: f64) -> f64 {
    4.0 / n / (t + 0.5 / n) * (1.0 / n.sqrt()) * (1.0 / n) * (1.0 - (1.0 - v) * f / 2_500.0)
}

#[inline]
fn mid_band(n: f64, t: f64, f: f64, v: f64) -> f64 {
    2.0 / n / (t + 0.5 / n)
        * (1.0 / (n * n))
        * (1.0 - t * f / 5_000.0)
        * (1.0 - (1.0 - v) * f / 8_000.0)
}

#[inline]
fn high_band(n: f64, t: f64, f: f64) -> f64 {
    let a = 1.0 / (n * n * n * (t + 0.0001)) - 0.00001;
    if a <= 0.0 {
        return 0.0;
    }
    a * (1.0 - t * f / 3_000.0)
}

#[inline]
fn crossfade(below: f64, above: f64, f: f64, edge: f64) -> f64 {
    let start = edge * (1.0 - CROSSFADE_WIDTH);
    let span = 2.0 * edge * CROSSFADE_WIDTH;
    let w = (f - start) / span;
    below.max(0.0) * (1.0 - w) + above.max(0.0) * w
}

/// Amplitude of partial `index` (1-based) at frequency `f` and note time `t`.
///
/// `cutoff` is the highest frequency allowed to sound; callers pass
/// `min(MAX_PARTIAL_FREQUENCY, nyquist)`. The result is never negative; zero
/// means "this partial and every one above it is silent".
pub fn partial_amplitude(index: usize, f: f64, t: f64, velocity: f64, cutoff: f64) -> f64 {
    if f >= cutoff.min(MAX_PARTIAL_FREQUENCY) {
        return 0.0;
    }
    let n = (index + 1) as f64;
    let v = velocity.clamp(0.0, 1.0);

    let low_start = LOW_BAND_EDGE * (1.0 - CROSSFADE_WIDTH);
    let low_end = LOW_BAND_EDGE * (1.0 + CROSSFADE_WIDTH);
    let mid_start = MID_BAND_EDGE * (1.0 - CROSSFADE_WIDTH);
    let mid_end = MID_BAND_EDGE * (1.0 + CROSSFADE_WIDTH);

    let a = if f < low_start {
        low_band(n, t, f, v)
    } else if f < low_end {
        crossfade(low_band(n, t, f, v), mid_band(n, t, f, v), f, LOW_BAND_EDGE)
    } else if f < mid_start {
        mid_band(n, t, f, v)
    } else if f < mid_end {
        crossfade(mid_band(n, t, f, v), high_band(n, t, f), f, MID_BAND_EDGE)
    } else {
        high_band(n, t, f)
    };

    if a > 0.0 {
        a
    } else {
        0.0
    }
}
