use oorandom::Rand64;

/// Independent draw sequences derived from one voice seed.
///
/// Each lane gets its own generator so that, for example, the number of
/// transient pan draws can never shift the partial layout of the next strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Partials = 1,
    TransientPan = 2,
}

/// Build the generator for `lane` of the voice seeded with `seed`.
pub fn stream(seed: u64, lane: Lane) -> Rand64 {
    Rand64::new(((seed as u128) << 64) | lane as u128)
}

/// Uniform draw in `[lo, hi)`.
#[inline]
pub fn uniform(rng: &mut Rand64, lo: f64, hi: f64) -> f64 {
    lo + rng.rand_float() * (hi - lo)
}
