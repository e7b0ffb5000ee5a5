use std::{
    collections::hash_map::RandomState,
    hash::{BuildHasher, Hasher},
    sync::Arc,
};

use oorandom::Rand64;

use crate::{
    config::{EngineConfig, ReleaseConfig, StealPolicy},
    dsp::{random, smoothing::MovingAverage},
    render::{BlockRenderer, StereoBlock},
    synth::{
        message::ControllerKind,
        params::{InstrumentParameters, SharedParameters},
        voice::Voice,
    },
};

/// Combined mode energy at or below which a voice is retired.
///
/// A voice whose excitation pulse is still running is never retired, whatever
/// its energy; see [`VoiceManager::set_free_inaudible_voices`].
pub const AUDIBILITY_THRESHOLD: f64 = 1e-5;
/// Block boundaries the mod wheel is averaged over.
const MOD_WHEEL_WINDOW: usize = 4;

/// Fixed pool of voices plus everything needed to drive them block by block.
///
/// Per block the caller runs, in order: [`begin_block`](Self::begin_block),
/// note and controller events interleaved with
/// [`update_voice_damping_and_energy`](Self::update_voice_damping_and_energy)
/// for each sample, [`get_block_of_samples`](Self::get_block_of_samples), and
/// finally [`set_free_inaudible_voices`](Self::set_free_inaudible_voices).
pub struct VoiceManager {
    voices: Vec<Voice>,
    params: SharedParameters,
    snapshot: Arc<InstrumentParameters>,
    renderer: BlockRenderer,
    block: StereoBlock,
    rng: Rand64,
    dt: f64,
    block_size: usize,
    block_len: usize,
    cursor: usize,
    steal_policy: StealPolicy,
    release: ReleaseConfig,
    noisy_transient: bool,
    mod_wheel: MovingAverage<MOD_WHEEL_WINDOW>,
    active: Vec<usize>,
}

impl VoiceManager {
    /// `config` is assumed to be validated.
    pub fn new(config: &EngineConfig, params: SharedParameters, renderer: BlockRenderer) -> Self {
        let seed = config.seed.unwrap_or_else(|| RandomState::new().build_hasher().finish());
        let block_size = config.block_size.max(1);
        let snapshot = params.snapshot();
        let mut mod_wheel = MovingAverage::new();
        mod_wheel.push(snapshot.mod_wheel);

        Self {
            voices: (0..config.max_voices.max(1))
                .map(|_| Voice::new(block_size))
                .collect(),
            params,
            snapshot,
            renderer,
            block: StereoBlock::new(block_size),
            rng: Rand64::new(seed as u128),
            dt: 1.0 / config.sample_rate,
            block_size,
            block_len: block_size,
            cursor: 0,
            steal_policy: config.steal_policy,
            release: config.release,
            noisy_transient: config.noisy_transient,
            mod_wheel,
            active: Vec::with_capacity(config.max_voices),
        }
    }

    /// Start a block of `len` samples (clamped to the configured block size).
    pub fn begin_block(&mut self, len: usize) {
        self.block_len = len.clamp(1, self.block_size);
        self.cursor = 0;
        for voice in &mut self.voices {
            voice.handover_len = 0;
        }
        self.sync_parameters();
        self.mod_wheel.push(self.snapshot.mod_wheel);
    }

    pub fn on_note_on(&mut self, note: u8, velocity: u8) {
        self.sync_parameters();
        let params = *self.snapshot;
        let index = self.allocate_voice();

        let range = params.string_detune_range;
        let string_detune = random::uniform(&mut self.rng, 1.0 - range, 1.0 + range);
        let seed = self.rng.rand_u64();
        let damping = note as f64 / 100.0 * params.damping;
        let cursor = self.cursor;
        let mod_wheel = self.mod_wheel.value();

        let voice = &mut self.voices[index];
        if voice.is_active() && cursor > 0 {
            // The stolen note keeps sounding up to the steal.
            self.renderer.render_handover(voice, &params, mod_wheel, cursor);
        }
        voice.strike(note, velocity as f64 / 127.0, damping, string_detune, seed);
        voice.refresh_partials(
            params.inharmonicity,
            params.num_partials,
            params.partial_detune_range,
        );
        voice.silence_before(cursor);
    }

    /// Marks matching voices as released. Only has an audible effect when a
    /// release damping is configured.
    pub fn on_note_off(&mut self, note: u8, _velocity: u8) {
        for voice in self.voices.iter_mut().filter(|v| v.note == Some(note)) {
            if self.release.damping.is_some() {
                voice.released = true;
            }
        }
    }

    /// Stores the controller in the shared snapshot. Voices are untouched.
    pub fn on_controller_change(&mut self, kind: ControllerKind, value: f64) {
        self.params.set_controller(kind, value);
        self.sync_parameters();
    }

    /// Integrate one sample of energy for every active voice.
    pub fn update_voice_damping_and_energy(&mut self, sample_index: usize) {
        let dt = self.dt;
        let release_target = if self.snapshot.sustain_held() {
            None
        } else {
            self.release.damping
        };
        let ramp = if self.release.ramp_secs > 0.0 {
            (dt / self.release.ramp_secs).min(1.0)
        } else {
            1.0
        };

        for voice in self.voices.iter_mut().filter(|v| v.is_active()) {
            if let (true, Some(target)) = (voice.released, release_target) {
                voice.damping += (target - voice.damping) * ramp;
            }
            voice.integrate(sample_index, dt, self.noisy_transient);
        }
        self.cursor = sample_index + 1;
    }

    /// Retire every voice whose stored energy has fallen to the threshold.
    ///
    /// A voice still inside its excitation pulse is kept: right after the
    /// strike its energy has not yet built up.
    pub fn set_free_inaudible_voices(&mut self) {
        for (index, voice) in self.voices.iter_mut().enumerate() {
            if voice.is_active()
                && !voice.excitation.is_active()
                && voice.energy() <= AUDIBILITY_THRESHOLD
            {
                tracing::trace!(index, note = ?voice.note, "voice retired");
                voice.free();
            }
        }
    }

    /// Render the current block. With no active voice the renderer is not
    /// touched and the block is all zeros.
    pub fn get_block_of_samples(&mut self) -> &StereoBlock {
        self.active.clear();
        self.active.extend(
            self.voices
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_active())
                .map(|(i, _)| i),
        );

        if self.active.is_empty() {
            self.block.clear(self.block_len);
            return &self.block;
        }

        let mod_wheel = self.mod_wheel.value();
        self.renderer.render(
            &self.voices,
            &self.active,
            &self.snapshot,
            mod_wheel,
            self.block_len,
            &mut self.block,
        );
        &self.block
    }

    /// The block produced by the last `get_block_of_samples` call.
    pub fn last_block(&self) -> &StereoBlock {
        &self.block
    }

    /// Free every voice at once.
    pub fn all_notes_off(&mut self) {
        for voice in &mut self.voices {
            voice.free();
        }
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn parameters(&self) -> &SharedParameters {
        &self.params
    }

    /// Mod wheel as seen by the renderer.
    pub fn mod_wheel(&self) -> f64 {
        self.mod_wheel.value()
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    pub fn executor_name(&self) -> &'static str {
        self.renderer.executor_name()
    }

    fn allocate_voice(&mut self) -> usize {
        // First pass: lowest free slot
        if let Some(index) = self.voices.iter().position(|v| v.is_free()) {
            return index;
        }

        // Second pass: steal. Strict comparison keeps the lowest index on ties.
        let mut chosen = 0;
        for (index, voice) in self.voices.iter().enumerate().skip(1) {
            let best = &self.voices[chosen];
            let better = match self.steal_policy {
                StealPolicy::Oldest => voice.age > best.age,
                StealPolicy::Quietest => voice.energy() < best.energy(),
            };
            if better {
                chosen = index;
            }
        }
        tracing::debug!(
            index = chosen,
            note = ?self.voices[chosen].note,
            policy = ?self.steal_policy,
            "voice stolen"
        );
        chosen
    }

    /// Pick up a newly published parameter snapshot, rebuilding partial
    /// tables if the layout changed.
    fn sync_parameters(&mut self) {
        let latest = self.params.snapshot();
        if Arc::ptr_eq(&latest, &self.snapshot) {
            return;
        }
        let layout_changed = self.snapshot.changes_partial_layout(&latest);
        self.snapshot = latest;
        if !layout_changed {
            return;
        }

        let p = *self.snapshot;
        let mut rebuilt = 0;
        for voice in &mut self.voices {
            if voice.refresh_partials(p.inharmonicity, p.num_partials, p.partial_detune_range) {
                rebuilt += 1;
            }
        }
        if rebuilt > 0 {
            tracing::debug!(
                voices = rebuilt,
                partials = p.num_partials,
                inharmonicity = p.inharmonicity,
                "partial tables regenerated"
            );
        }
    }
}
