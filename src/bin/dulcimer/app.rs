//! Live playback: a sequencer thread feeds the audio callback through a
//! lock-free message ring.

use std::{
    thread,
    time::{Duration, Instant},
};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use dulcimer::{synth::SynthMessage, Engine, EngineConfig, MAX_BLOCK_SIZE};
use rtrb::RingBuffer;

use super::phrase::Phrase;

const MESSAGE_CAPACITY: usize = 256;

pub fn play(mut config: EngineConfig, phrase: Phrase, repeat: bool) -> EyreResult<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let stream_config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let channels = stream_config.channels() as usize;
    config.sample_rate = stream_config.sample_rate().0 as f64;

    let mut engine = Engine::new(config).wrap_err("failed to build engine")?;
    let (mut tx, mut rx) = RingBuffer::<SynthMessage>::new(MESSAGE_CAPACITY);

    tracing::info!(
        device = %device.name().unwrap_or_default(),
        sample_rate = engine.sample_rate(),
        channels,
        notes = phrase.notes.len(),
        "playing, press Ctrl+C to stop"
    );

    let mut left = vec![0.0f32; MAX_BLOCK_SIZE];
    let mut right = vec![0.0f32; MAX_BLOCK_SIZE];

    let stream = device.build_output_stream(
        &stream_config.into(),
        move |data: &mut [f32], _| {
            engine.receive(&mut rx);

            let total_frames = data.len() / channels;
            let mut frames_written = 0;
            while frames_written < total_frames {
                let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                let (l, r) = (&mut left[..frames], &mut right[..frames]);
                engine.process(l, r);

                let out_off = frames_written * channels;
                for i in 0..frames {
                    let frame = &mut data[out_off + i * channels..out_off + (i + 1) * channels];
                    match frame {
                        [mono] => *mono = 0.5 * (l[i] + r[i]),
                        [fl, fr, rest @ ..] => {
                            *fl = l[i];
                            *fr = r[i];
                            rest.fill(0.0);
                        }
                        [] => {}
                    }
                }
                frames_written += frames;
            }
        },
        |err| tracing::error!(%err, "audio stream error"),
        None,
    )?;
    stream.play()?;

    let mut events = Vec::new();
    for note in &phrase.notes {
        events.push((note.start, SynthMessage::NoteOn { note: note.note, velocity: note.velocity }));
        events.push((note.start + note.length, SynthMessage::NoteOff { note: note.note, velocity: 0 }));
    }
    events.sort_by(|a, b| a.0.total_cmp(&b.0));
    let cycle = phrase.duration().max(0.1) + 0.5;

    loop {
        let started = Instant::now();
        for &(at, message) in &events {
            let due = started + Duration::from_secs_f64(at);
            if let Some(wait) = due.checked_duration_since(Instant::now()) {
                thread::sleep(wait);
            }
            if tx.push(message).is_err() {
                tracing::warn!(?message, "message ring full, dropping event");
            }
        }
        if !repeat {
            break;
        }
        let due = started + Duration::from_secs_f64(cycle);
        if let Some(wait) = due.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
    }

    // Let the last notes ring out.
    thread::sleep(Duration::from_secs(3));
    Ok(())
}
