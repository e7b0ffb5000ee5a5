//! Offline render of a phrase to a 16-bit stereo WAV file

use std::path::Path;

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use dulcimer::{Engine, EngineConfig};

use super::phrase::Phrase;

pub fn render_to_wav(config: EngineConfig, phrase: &Phrase, tail: f64, out: &Path) -> EyreResult<()> {
    let sample_rate = config.sample_rate;
    let mut engine = Engine::new(config).wrap_err("failed to build engine")?;
    let block_size = engine.block_size();

    let total = ((phrase.duration() + tail.max(0.0)) * sample_rate).ceil() as u64;
    let messages = phrase.messages(sample_rate);
    let mut next = 0;

    let spec = hound::WavSpec {
        channels: dulcimer::NUM_CHANNELS as u16,
        sample_rate: sample_rate.round() as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(out, spec)
        .wrap_err_with(|| format!("failed to create {}", out.display()))?;

    let mut left = vec![0.0f32; block_size];
    let mut right = vec![0.0f32; block_size];
    let mut position = 0u64;
    let mut peak = 0.0f32;

    while position < total {
        let frames = (total - position).min(block_size as u64) as usize;
        let end = position + frames as u64;
        while let Some(&(sample, message)) = messages.get(next) {
            if sample >= end {
                break;
            }
            engine.schedule(sample.saturating_sub(position) as usize, message);
            next += 1;
        }

        engine.process(&mut left[..frames], &mut right[..frames]);
        for (&l, &r) in left[..frames].iter().zip(&right[..frames]) {
            peak = peak.max(l.abs()).max(r.abs());
            writer.write_sample((l * i16::MAX as f32) as i16)?;
            writer.write_sample((r * i16::MAX as f32) as i16)?;
        }
        position = end;
    }

    writer.finalize().wrap_err("failed to finalize WAV")?;
    tracing::info!(
        path = %out.display(),
        seconds = total as f64 / sample_rate,
        peak,
        "render complete"
    );
    Ok(())
}
