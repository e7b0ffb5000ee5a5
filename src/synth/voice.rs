use oorandom::Rand64;

use crate::{
    dsp::{
        excitation::ExcitationPulse,
        partials::{PartialBank, PartialSpec},
        random::{self, Lane},
        transient::{self, TinkerbellMap},
    },
    render::Frame,
};

/// Fraction of injected energy routed into the horizontal (slow) mode.
pub const DEFAULT_MODE_COUPLING: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,   // Available for allocation
    Active, // Sounding, energy above the audibility threshold
}

/// One note slot of the pool.
///
/// All mutation goes through [`crate::synth::manager::VoiceManager`]; outside
/// the crate a voice is read-only.
#[derive(Debug, Clone)]
pub struct Voice {
    pub(crate) note: Option<u8>,
    pub(crate) frequency: f64,
    pub(crate) velocity: f64,
    pub(crate) energy_vert: f64,
    pub(crate) energy_horiz: f64,
    pub(crate) damping: f64,
    pub(crate) mode_coupling: f64,
    pub(crate) excitation: ExcitationPulse,
    pub(crate) string_detune: f64,
    pub(crate) seed: u64,
    pub(crate) age: f64,
    pub(crate) released: bool,
    pub(crate) bank: PartialBank,

    // Per-sample state for the block being built; the renderer only reads these.
    pub(crate) energy_track: Vec<f64>,
    pub(crate) time_track: Vec<f64>,
    pub(crate) transient_track: Vec<[f64; 2]>,
    // Frames of a note stolen mid-block, valid for samples before `handover_len`.
    pub(crate) handover_track: Vec<Frame>,
    pub(crate) handover_len: usize,

    transient: TinkerbellMap,
    pan_rng: Rand64,
}

impl Voice {
    pub fn new(block_size: usize) -> Self {
        Self {
            note: None,
            frequency: 0.0,
            velocity: 0.0,
            energy_vert: 0.0,
            energy_horiz: 0.0,
            damping: 0.0,
            mode_coupling: DEFAULT_MODE_COUPLING,
            excitation: ExcitationPulse::idle(),
            string_detune: 1.0,
            seed: 0,
            age: 0.0,
            released: false,
            bank: PartialBank::new(),
            energy_track: vec![0.0; block_size],
            time_track: vec![-1.0; block_size],
            transient_track: vec![[0.0; 2]; block_size],
            handover_track: vec![[0.0; 2]; block_size],
            handover_len: 0,
            transient: TinkerbellMap::new(),
            pan_rng: random::stream(0, Lane::TransientPan),
        }
    }

    /// Start a strike. Residual string energy is kept, scaled down by how
    /// hard the new strike is, so a repeated note does not click.
    pub(crate) fn strike(
        &mut self,
        note: u8,
        velocity: f64,
        damping: f64,
        string_detune: f64,
        seed: u64,
    ) {
        let v = velocity.clamp(0.0, 1.0);
        if self.note.is_none() {
            self.energy_vert = 0.0;
            self.energy_horiz = 0.0;
        }
        self.energy_vert *= 1.0 - v;
        self.energy_horiz *= 1.0 - v;

        self.note = Some(note);
        self.frequency = midi_note_to_freq(note);
        self.velocity = v;
        self.damping = damping;
        self.mode_coupling = DEFAULT_MODE_COUPLING;
        self.excitation = ExcitationPulse::strike(v);
        self.string_detune = string_detune;
        self.seed = seed;
        self.age = 0.0;
        self.released = false;
        self.bank.clear();
        self.transient.reset();
        self.pan_rng = random::stream(seed, Lane::TransientPan);
    }

    /// Full reset back to the free state.
    pub(crate) fn free(&mut self) {
        self.note = None;
        self.frequency = 0.0;
        self.velocity = 0.0;
        self.energy_vert = 0.0;
        self.energy_horiz = 0.0;
        self.damping = 0.0;
        self.excitation = ExcitationPulse::idle();
        self.string_detune = 1.0;
        self.age = 0.0;
        self.released = false;
        self.bank.clear();
        self.energy_track.fill(0.0);
        self.time_track.fill(-1.0);
        self.transient_track.fill([0.0; 2]);
        self.handover_len = 0;
    }

    /// Rebuild the partial table from the current note and `inharmonicity`,
    /// `num_partials`, `partial_detune`. Returns true if it changed.
    pub(crate) fn refresh_partials(
        &mut self,
        inharmonicity: f64,
        num_partials: usize,
        partial_detune: f64,
    ) -> bool {
        if self.note.is_none() {
            return false;
        }
        self.bank.refresh(PartialSpec {
            frequency: self.frequency,
            inharmonicity,
            num_partials,
            partial_detune,
            string_detune: self.string_detune,
            seed: self.seed,
        })
    }

    /// Integrate one sample of energy and record it at `index` in the tracks.
    pub(crate) fn integrate(&mut self, index: usize, dt: f64, noisy_transient: bool) {
        let t = self.excitation.time_since_strike;

        let delta = self.excitation.energy_delta(dt);
        self.energy_vert += delta * (1.0 - self.mode_coupling);
        self.energy_horiz += delta * self.mode_coupling;

        let vert_decay = (1.0 - dt * self.damping * (1.0 - self.mode_coupling)).max(0.0);
        let horiz_decay = (1.0 - dt * self.damping * self.mode_coupling).max(0.0);
        self.energy_vert *= vert_decay;
        self.energy_horiz *= horiz_decay;

        let energy = self.energy();
        if index < self.energy_track.len() {
            self.energy_track[index] = energy;
            self.time_track[index] = t;
            self.transient_track[index] = if noisy_transient && transient::in_transient(t) {
                let noise = transient::strike_noise(self.transient.step(), t);
                let pan = self.pan_rng.rand_float();
                [noise * (1.0 - pan), noise * pan]
            } else {
                [0.0; 2]
            };
        }

        self.excitation.advance(dt);
        self.age += dt;
    }

    /// Mark samples before `until` as silent. Used when a strike lands mid-block.
    pub(crate) fn silence_before(&mut self, until: usize) {
        let until = until.min(self.energy_track.len());
        self.energy_track[..until].fill(0.0);
        self.time_track[..until].fill(-1.0);
        self.transient_track[..until].fill([0.0; 2]);
    }

    pub fn state(&self) -> VoiceState {
        if self.note.is_some() {
            VoiceState::Active
        } else {
            VoiceState::Free
        }
    }

    pub fn is_free(&self) -> bool {
        self.note.is_none()
    }

    pub fn is_active(&self) -> bool {
        self.note.is_some()
    }

    pub fn note(&self) -> Option<u8> {
        self.note
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn energy(&self) -> f64 {
        self.energy_vert + self.energy_horiz
    }

    pub fn energy_modes(&self) -> (f64, f64) {
        (self.energy_vert, self.energy_horiz)
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn string_detune(&self) -> f64 {
        self.string_detune
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn excitation(&self) -> &ExcitationPulse {
        &self.excitation
    }

    pub fn partials(&self) -> &PartialBank {
        &self.bank
    }

    /// Combined energy per sample of the current block.
    pub fn energy_track(&self) -> &[f64] {
        &self.energy_track
    }

    /// Note time per sample of the current block; negative before the strike.
    pub fn time_track(&self) -> &[f64] {
        &self.time_track
    }

    pub fn transient_track(&self) -> &[[f64; 2]] {
        &self.transient_track
    }
}

/// Equal-tempered frequency of a MIDI note, A4 = 440 Hz.
#[inline]
pub fn midi_note_to_freq(note: u8) -> f64 {
    440.0 * 2.0_f64.powf((note as f64 - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 44_100.0;

    #[test]
    fn a4_is_440() {
        assert_eq!(midi_note_to_freq(69), 440.0);
        assert!((midi_note_to_freq(60) - 261.625_565).abs() < 1e-5);
    }

    #[test]
    fn new_voice_is_free() {
        let voice = Voice::new(64);
        assert_eq!(voice.state(), VoiceState::Free);
        assert_eq!(voice.energy(), 0.0);
        assert_eq!(voice.energy_track().len(), 64);
    }

    #[test]
    fn strike_then_integrate_builds_energy() {
        let mut voice = Voice::new(256);
        voice.strike(60, 0.8, 1.5, 1.0, 9);
        assert!(voice.is_active());
        for i in 0..256 {
            voice.integrate(i, DT, true);
        }
        assert!(voice.energy() > 0.0);
        let (vert, horiz) = voice.energy_modes();
        assert!(vert > horiz);
        assert_eq!(voice.energy_track()[255], voice.energy());
        assert_eq!(voice.time_track()[0], 0.0);
    }

    #[test]
    fn restrike_scales_residual_energy() {
        let mut voice = Voice::new(16);
        voice.strike(60, 1.0, 0.6, 1.0, 1);
        voice.energy_vert = 0.4;
        voice.energy_horiz = 0.2;
        voice.strike(60, 0.25, 0.6, 1.0, 2);
        let (vert, horiz) = voice.energy_modes();
        assert!((vert - 0.3).abs() < 1e-12);
        assert!((horiz - 0.15).abs() < 1e-12);
        assert_eq!(voice.age(), 0.0);
    }

    #[test]
    fn free_resets_everything() {
        let mut voice = Voice::new(8);
        voice.strike(72, 0.5, 0.72, 1.0005, 3);
        voice.refresh_partials(0.003, 10, 1.0);
        voice.integrate(0, DT, false);
        voice.free();
        assert!(voice.is_free());
        assert!(voice.partials().is_empty());
        assert_eq!(voice.energy(), 0.0);
        assert!(voice.energy_track().iter().all(|&e| e == 0.0));
    }

    #[test]
    fn silence_before_marks_leading_samples() {
        let mut voice = Voice::new(8);
        voice.strike(60, 1.0, 0.6, 1.0, 5);
        for i in 0..8 {
            voice.integrate(i, DT, true);
        }
        voice.silence_before(3);
        assert!(voice.energy_track()[..3].iter().all(|&e| e == 0.0));
        assert!(voice.time_track()[..3].iter().all(|&t| t < 0.0));
        assert!(voice.energy_track()[3] > 0.0);
    }
}
