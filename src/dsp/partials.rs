use super::random::{self, Lane};

/*
Inharmonic Partials
===================

A real string is not a perfect harmonic oscillator. Its stiffness pushes every
overtone slightly sharp, and the higher the overtone the sharper it gets. This
is why piano tuners "stretch" octaves, and why a struck string sounds metallic
rather than like a sawtooth.

Vocabulary
----------

  partial         One sinusoidal component of the tone. Partial 1 is the
                  fundamental, partial 2 sits near twice its frequency, etc.

  B               The inharmonicity coefficient. B = 0 gives exact harmonics;
                  a piano bass string is around 0.0001, a stiff bar much more.

  string pair     Hammered instruments strike two (or three) strings per note,
                  tuned a hair apart. The slow beating between them is what
                  makes the sound shimmer. We model two strings per note.


The Stiff-String Equation (Fletcher)
------------------------------------

    f_i = f0 * i * sqrt(1 + B * i^2)

    i     B = 0.003 multiplier      ideal
    1     1.0015                    1
    2     2.0120                    2
    4     4.0950                    4
    8     8.7290                    8

On top of that each partial gets a tiny random jitter (default +-0.2%) so the
sum never becomes perfectly periodic, and the second string is scaled by the
per-strike string detune.


Why Regenerate Instead of Update
--------------------------------

The set is rebuilt from scratch whenever the note, B, the partial count or the
detune range changes. Building is O(partials) with one sqrt each; the per
sample work is O(partials) sines anyway, so caching the frequencies and
throwing the whole table away on change is both cheaper and impossible to get
subtly out of sync.

All randomness is drawn from a generator seeded only by the voice seed, so the
same (frequency, B, count, detune, seed) always yields the same table.
*/

/// Base frequency jitter per partial (+-0.2%), scaled by the partial detune range.
pub const PARTIAL_JITTER: f64 = 0.002;
/// Amplitude multipliers are drawn from `1 +- AMPLITUDE_SPREAD`.
pub const AMPLITUDE_SPREAD: f64 = 0.1;
pub const MIN_PARTIALS: usize = 1;
pub const MAX_PARTIALS: usize = 200;

/// One partial of the two-string pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partial {
    pub freq1: f64,
    pub freq2: f64,
    pub amp1: f64,
    pub amp2: f64,
    pub pan1: f64,
    pub pan2: f64,
}

/// Everything the partial table is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialSpec {
    pub frequency: f64,
    pub inharmonicity: f64,
    pub num_partials: usize,
    pub partial_detune: f64,
    pub string_detune: f64,
    pub seed: u64,
}

/// Stiff-string frequency multiplier for partial `index` (1-based).
#[inline]
pub fn stretch(index: usize, inharmonicity: f64) -> f64 {
    let i = index as f64;
    i * (1.0 + inharmonicity * i * i).sqrt()
}

/// Build the partial table for `spec`.
pub fn generate(spec: &PartialSpec) -> Vec<Partial> {
    let count = spec.num_partials.clamp(MIN_PARTIALS, MAX_PARTIALS);
    let jitter = PARTIAL_JITTER * spec.partial_detune.max(0.0);
    let (freq_lo, freq_hi) = (1.0 - jitter, 1.0 + jitter);
    let (amp_lo, amp_hi) = (1.0 - AMPLITUDE_SPREAD, 1.0 + AMPLITUDE_SPREAD);

    let mut rng = random::stream(spec.seed, Lane::Partials);

    (1..=count)
        .map(|i| {
            let base = spec.frequency * stretch(i, spec.inharmonicity);
            let freq1 = base * random::uniform(&mut rng, freq_lo, freq_hi);
            let freq2 = base * random::uniform(&mut rng, freq_lo, freq_hi) * spec.string_detune;
            let amp1 = random::uniform(&mut rng, amp_lo, amp_hi);
            let amp2 = random::uniform(&mut rng, amp_lo, amp_hi);
            let pan1 = rng.rand_float();
            let pan2 = rng.rand_float();
            Partial {
                freq1,
                freq2,
                amp1,
                amp2,
                pan1,
                pan2,
            }
        })
        .collect()
}

/// A voice's partial table together with the spec it was built from.
#[derive(Debug, Clone, Default)]
pub struct PartialBank {
    spec: Option<PartialSpec>,
    partials: Vec<Partial>,
}

impl PartialBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the table. The old allocation is dropped, never patched.
    pub fn regenerate(&mut self, spec: PartialSpec) {
        self.partials = generate(&spec);
        self.spec = Some(spec);
    }

    /// Rebuild only if `spec` differs from the one the table came from.
    ///
    /// Returns true when a rebuild happened.
    pub fn refresh(&mut self, spec: PartialSpec) -> bool {
        if self.spec == Some(spec) {
            return false;
        }
        self.regenerate(spec);
        true
    }

    /// A bank holding exactly `partials`, with no spec behind it.
    #[cfg(test)]
    pub(crate) fn from_partials(partials: Vec<Partial>) -> Self {
        Self {
            spec: None,
            partials,
        }
    }

    pub fn clear(&mut self) {
        self.spec = None;
        self.partials = Vec::new();
    }

    pub fn spec(&self) -> Option<&PartialSpec> {
        self.spec.as_ref()
    }

    pub fn partials(&self) -> &[Partial] {
        &self.partials
    }

    pub fn len(&self) -> usize {
        self.partials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partials.is_empty()
    }
}
