use std::f64::consts::TAU;

use super::{work_group_size, Frame, ParallelExecutor, StereoBlock};
use crate::{
    dsp::{
        envelope::{partial_amplitude, MAX_PARTIAL_FREQUENCY},
        tilt::{brightened_velocity, pitch_bend_ratio, SpectralTilt},
    },
    synth::{params::InstrumentParameters, voice::Voice},
};

/*
Per-Sample Voice Synthesis
==========================

One map unit produces one stereo frame for one voice at one sample:

    t        note time of the sample (from the voice's time track)
    E        stored string energy at the sample (energy track)

    for each partial i:
        A  = A(i, f_1, t, v) * tilt(f_1)
        for string k in {1, 2}:
            s_k = sin(2 pi (t - PRE_DELAY) f_k) * amp_k * A
            pan = pan_k - (pan_k - 0.5) / (PAN_SPREAD t + 1)
            L  += s_k (1 - pan)
            R  += s_k pan

    frame = (MIX * (L, R) + strike noise) * E

Both strings of a partial share the envelope of the first string; the
detune between them is far too small to move a partial across a band. Pans
start at the centre and drift out to their drawn position, so the attack is
mono and the ring widens. The partial loop stops at the first partial whose
envelope is zero.

A voice stolen mid-block has the old note's frames for the samples before
the steal rendered up front into its handover track; those are returned as
they are.
*/

/// Partials stay silent for this long after the strike.
pub const PARTIAL_PRE_DELAY: f64 = 0.005;
/// Output scale applied to every voice.
pub const MIX: f64 = 0.03;
/// How fast partial pans spread out from the centre.
pub const PAN_SPREAD: f64 = 5.0;

/// Block-wide values every map unit needs.
#[derive(Debug, Clone, Copy)]
struct SynthContext {
    cutoff: f64,
    bend: f64,
    mod_wheel: f64,
    linear: f64,
    squared: f64,
    cubic: f64,
    brightness_a: f64,
    brightness_b: f64,
}

impl SynthContext {
    fn new(params: &InstrumentParameters, sample_rate: f64, mod_wheel: f64) -> Self {
        Self {
            cutoff: MAX_PARTIAL_FREQUENCY.min(sample_rate / 2.0),
            bend: pitch_bend_ratio(params.pitch_bend_coarse, params.pitch_bend_fine),
            mod_wheel,
            linear: params.linear_term,
            squared: params.squared_term,
            cubic: params.cubic_term,
            brightness_a: params.brightness_a,
            brightness_b: params.brightness_b,
        }
    }
}

/// Stereo contribution of `voice` at sample `index` of the current block.
fn synthesize(voice: &Voice, index: usize, ctx: &SynthContext) -> Frame {
    if index < voice.handover_len {
        return voice.handover_track[index];
    }
    let energy = voice.energy_track[index];
    let t = voice.time_track[index];
    if energy <= 0.0 || t < 0.0 {
        return [0.0; 2];
    }

    let mut left = 0.0;
    let mut right = 0.0;

    if t > PARTIAL_PRE_DELAY {
        let phase_time = t - PARTIAL_PRE_DELAY;
        let velocity = brightened_velocity(voice.velocity, ctx.mod_wheel);
        let tilt = SpectralTilt::new(
            ctx.linear,
            ctx.squared,
            ctx.cubic,
            ctx.brightness_a,
            ctx.brightness_b,
            voice.velocity,
        );
        let spread = 1.0 / (PAN_SPREAD * t + 1.0);

        for (k, p) in voice.bank.partials().iter().enumerate() {
            let index = k + 1;
            let f1 = p.freq1 * ctx.bend;
            let f2 = p.freq2 * ctx.bend;
            let a = partial_amplitude(index, f1, t, velocity, ctx.cutoff);
            if a <= 0.0 {
                break;
            }
            let a = a * tilt.gain(f1);

            let s1 = (TAU * phase_time * f1).sin() * p.amp1 * a;
            let s2 = (TAU * phase_time * f2).sin() * p.amp2 * a;
            let pan1 = p.pan1 - (p.pan1 - 0.5) * spread;
            let pan2 = p.pan2 - (p.pan2 - 0.5) * spread;

            left += s1 * (1.0 - pan1) + s2 * (1.0 - pan2);
            right += s1 * pan1 + s2 * pan2;
        }
    }

    let [noise_l, noise_r] = voice.transient_track[index];
    let frame = [
        (left * MIX + noise_l) * energy,
        (right * MIX + noise_r) * energy,
    ];
    [sanitize(frame[0]), sanitize(frame[1])]
}

/// NaN, infinities and denormals become silence.
#[inline]
fn sanitize(x: f64) -> f64 {
    if x.is_normal() {
        x
    } else {
        0.0
    }
}

/// Owns the executor and the scratch memory for map and reduce.
pub struct BlockRenderer {
    executor: Box<dyn ParallelExecutor>,
    sample_rate: f64,
    preferred_group_size: usize,
    units: Vec<Frame>,
    mixed: Vec<Frame>,
}

impl BlockRenderer {
    pub fn new(
        executor: Box<dyn ParallelExecutor>,
        sample_rate: f64,
        block_size: usize,
        max_voices: usize,
        preferred_group_size: usize,
    ) -> Self {
        Self {
            executor,
            sample_rate,
            preferred_group_size: preferred_group_size.max(1),
            units: Vec::with_capacity(block_size * max_voices),
            mixed: Vec::with_capacity(block_size),
        }
    }

    pub fn executor_name(&self) -> &'static str {
        self.executor.name()
    }

    /// Render the samples of `voice` before `until` into its handover track.
    ///
    /// Called right before a sounding voice is re-struck mid-block, while its
    /// tracks and partials still describe the old note.
    pub(crate) fn render_handover(
        &self,
        voice: &mut Voice,
        params: &InstrumentParameters,
        mod_wheel: f64,
        until: usize,
    ) {
        let until = until.min(voice.handover_track.len());
        let ctx = SynthContext::new(params, self.sample_rate, mod_wheel);
        for index in 0..until {
            let frame = synthesize(voice, index, &ctx);
            voice.handover_track[index] = frame;
        }
        voice.handover_len = voice.handover_len.max(until);
    }

    /// Render `block_len` samples of the voices at `active` into `out`.
    ///
    /// The energy, time and transient tracks of those voices must already be
    /// filled for the block.
    pub fn render(
        &mut self,
        voices: &[Voice],
        active: &[usize],
        params: &InstrumentParameters,
        mod_wheel: f64,
        block_len: usize,
        out: &mut StereoBlock,
    ) {
        out.clear(block_len);
        if active.is_empty() || block_len == 0 {
            return;
        }

        let ctx = SynthContext::new(params, self.sample_rate, mod_wheel);
        let total = block_len * active.len();
        let group = work_group_size(block_len, active.len(), self.preferred_group_size);

        self.units.clear();
        self.units.resize(total, [0.0; 2]);
        let unit = |u: usize| synthesize(&voices[active[u / block_len]], u % block_len, &ctx);
        self.executor.map(&mut self.units, group, &unit);

        self.mixed.clear();
        self.mixed.resize(block_len, [0.0; 2]);
        self.executor
            .reduce(&self.units, params.expression, &mut self.mixed);

        for (i, frame) in self.mixed.iter().enumerate() {
            out.left[i] = frame[0] as f32;
            out.right[i] = frame[1] as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dsp::partials::{Partial, PartialBank},
        render::{SequentialExecutor, CLIP_LEVEL},
    };

    const SR: f64 = 44_100.0;

    fn struck_voice(block: usize, samples: usize) -> Voice {
        let mut voice = Voice::new(block);
        voice.strike(60, 100.0 / 127.0, 1.5, 1.0, 21);
        voice.refresh_partials(0.003, 10, 1.0);
        for i in 0..samples {
            voice.integrate(i % block, 1.0 / SR, true);
        }
        voice
    }

    fn renderer() -> BlockRenderer {
        BlockRenderer::new(Box::new(SequentialExecutor), SR, 256, 4, 256)
    }

    #[test]
    fn silent_before_pre_delay_without_transient() {
        let mut voice = Voice::new(64);
        voice.strike(60, 1.0, 1.5, 1.0, 3);
        voice.refresh_partials(0.003, 10, 1.0);
        for i in 0..64 {
            voice.integrate(i, 1.0 / SR, false);
        }
        let ctx = SynthContext::new(&InstrumentParameters::default(), SR, 0.0);
        for i in 0..64 {
            assert_eq!(synthesize(&voice, i, &ctx), [0.0; 2]);
        }
    }

    #[test]
    fn sounding_voice_produces_output() {
        let voice = struck_voice(256, 4096);
        let mut out = StereoBlock::default();
        renderer().render(&[voice], &[0], &InstrumentParameters::default(), 0.0, 256, &mut out);
        assert_eq!(out.len(), 256);
        assert!(out.peak() > 0.0);
        assert!(out.peak() <= CLIP_LEVEL as f32);
    }

    #[test]
    fn zero_expression_is_silent() {
        let voice = struck_voice(256, 4096);
        let params = InstrumentParameters {
            expression: 0.0,
            ..InstrumentParameters::default()
        };
        let mut out = StereoBlock::default();
        renderer().render(&[voice], &[0], &params, 0.0, 256, &mut out);
        assert!(out.is_silent());
    }

    #[test]
    fn no_active_voices_gives_zeroed_block() {
        let voice = struck_voice(256, 4096);
        let mut out = StereoBlock::new(3);
        out.left[0] = 1.0;
        renderer().render(&[voice], &[], &InstrumentParameters::default(), 0.0, 128, &mut out);
        assert_eq!(out.len(), 128);
        assert!(out.is_silent());
    }

    #[test]
    fn sanitize_drops_non_finite_and_denormal() {
        assert_eq!(sanitize(f64::NAN), 0.0);
        assert_eq!(sanitize(f64::INFINITY), 0.0);
        assert_eq!(sanitize(f64::MIN_POSITIVE / 4.0), 0.0);
        assert_eq!(sanitize(0.25), 0.25);
    }

    /// Flat tilt, no bend, no mod wheel: only the envelope shapes partials.
    fn flat_params() -> InstrumentParameters {
        InstrumentParameters {
            linear_term: 0.0,
            squared_term: 0.0,
            cubic_term: 0.0,
            ..InstrumentParameters::default()
        }
    }

    fn partial(freq1: f64, freq2: f64, amp1: f64, amp2: f64, pan1: f64, pan2: f64) -> Partial {
        Partial {
            freq1,
            freq2,
            amp1,
            amp2,
            pan1,
            pan2,
        }
    }

    /// A full-velocity voice with the given partials and one hand-set sample.
    fn voice_at(partials: Vec<Partial>, t: f64, energy: f64, noise: Frame) -> Voice {
        let mut voice = Voice::new(4);
        voice.strike(60, 1.0, 1.5, 1.0, 1);
        voice.bank = PartialBank::from_partials(partials);
        voice.energy_track[0] = energy;
        voice.time_track[0] = t;
        voice.transient_track[0] = noise;
        voice
    }

    #[test]
    fn single_partial_matches_closed_form() {
        let (t, energy, noise) = (0.105, 0.5, [0.01, -0.02]);
        let p = partial(440.0, 441.0, 1.0, 0.9, 0.2, 0.7);
        let voice = voice_at(vec![p], t, energy, noise);
        let ctx = SynthContext::new(&flat_params(), SR, 0.0);

        // partial 1, n = 2, low band at full velocity
        let n = 2.0_f64;
        let a = 4.0 / n / (t + 0.5 / n) * (1.0 / n.sqrt()) * (1.0 / n);
        let phase = t - PARTIAL_PRE_DELAY;
        let s1 = (TAU * phase * p.freq1).sin() * p.amp1 * a;
        let s2 = (TAU * phase * p.freq2).sin() * p.amp2 * a;
        let spread = 1.0 / (PAN_SPREAD * t + 1.0);
        let pan1 = p.pan1 - (p.pan1 - 0.5) * spread;
        let pan2 = p.pan2 - (p.pan2 - 0.5) * spread;
        let left = (s1 * (1.0 - pan1) + s2 * (1.0 - pan2)) * MIX;
        let right = (s1 * pan1 + s2 * pan2) * MIX;
        let expected = [(left + noise[0]) * energy, (right + noise[1]) * energy];

        let frame = synthesize(&voice, 0, &ctx);
        assert!((frame[0] - expected[0]).abs() < 1e-12, "{frame:?} vs {expected:?}");
        assert!((frame[1] - expected[1]).abs() < 1e-12, "{frame:?} vs {expected:?}");
    }

    #[test]
    fn strike_noise_is_not_scaled_by_mix() {
        // before the pre-delay only the transient sounds
        let voice = voice_at(vec![partial(440.0, 441.0, 1.0, 1.0, 0.5, 0.5)], 0.001, 0.25, [0.04, -0.08]);
        let ctx = SynthContext::new(&flat_params(), SR, 0.0);
        assert_eq!(synthesize(&voice, 0, &ctx), [0.04 * 0.25, -0.08 * 0.25]);
    }

    #[test]
    fn second_string_follows_first_string_envelope() {
        // string 1 just under the cutoff, string 2 just over it
        let t = 0.006;
        let p = partial(19_950.0, 20_029.8, 0.0, 1.0, 0.5, 0.5);
        let voice = voice_at(vec![p], t, 1.0, [0.0; 2]);
        let ctx = SynthContext::new(&flat_params(), SR, 0.0);

        let a = partial_amplitude(1, p.freq1, t, 1.0, ctx.cutoff);
        assert!(a > 0.0);
        let s2 = (TAU * (t - PARTIAL_PRE_DELAY) * p.freq2).sin() * a;
        let frame = synthesize(&voice, 0, &ctx);
        assert!(frame[0] != 0.0);
        assert!((frame[0] - s2 * 0.5 * MIX).abs() < 1e-12);
        assert!((frame[1] - s2 * 0.5 * MIX).abs() < 1e-12);
    }

    #[test]
    fn loop_stops_at_first_silent_partial() {
        // partial 1 sits above the cutoff, so partial 2 is never reached
        let partials = vec![
            partial(21_000.0, 21_000.0, 1.0, 1.0, 0.5, 0.5),
            partial(440.0, 440.0, 1.0, 1.0, 0.5, 0.5),
        ];
        let voice = voice_at(partials, 0.1, 1.0, [0.0; 2]);
        let ctx = SynthContext::new(&flat_params(), SR, 0.0);
        assert_eq!(synthesize(&voice, 0, &ctx), [0.0; 2]);
    }

    #[test]
    fn broken_voice_is_silenced_alone() {
        let healthy = struck_voice(256, 4096);
        let mut broken = struck_voice(256, 4096);
        let nan = partial(440.0, 441.0, f64::NAN, f64::NAN, 0.5, 0.5);
        broken.bank = PartialBank::from_partials(vec![nan]);
        let params = InstrumentParameters::default();

        let mut alone = StereoBlock::default();
        renderer().render(&[healthy.clone()], &[0], &params, 0.0, 256, &mut alone);
        let mut mixed = StereoBlock::default();
        renderer().render(&[healthy, broken], &[0, 1], &params, 0.0, 256, &mut mixed);

        assert!(alone.peak() > 0.0);
        assert_eq!(mixed, alone);
    }

    #[test]
    fn handover_frames_replace_leading_samples() {
        let mut voice = struck_voice(256, 4096);
        let params = InstrumentParameters::default();
        let r = renderer();
        r.render_handover(&mut voice, &params, 0.0, 100);
        let ctx = SynthContext::new(&params, SR, 0.0);
        let before: Vec<Frame> = (0..100).map(|i| voice.handover_track[i]).collect();
        assert!(before.iter().any(|f| f[0] != 0.0));

        // a silent new note does not disturb the handed-over samples
        voice.silence_before(256);
        for (i, frame) in before.iter().enumerate() {
            assert_eq!(synthesize(&voice, i, &ctx), *frame);
        }
        assert_eq!(synthesize(&voice, 100, &ctx), [0.0; 2]);
    }

    #[test]
    fn pans_start_centred() {
        // t just past the pre-delay, spread ~ 1
        let spread = 1.0 / (PAN_SPREAD * PARTIAL_PRE_DELAY + 1.0);
        let pan = 1.0 - (1.0 - 0.5) * spread;
        assert!(pan < 0.52);
    }
}
