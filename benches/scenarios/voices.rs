//! Benchmarks for full engine blocks at different polyphony.
//!
//! Each case keeps `voices` notes sounding and renders one block per
//! iteration, with the sequential and the rayon executor.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use dulcimer::{
    render::{ParallelExecutor, RayonExecutor, SequentialExecutor},
    synth::SynthMessage,
    Engine, EngineConfig,
};

use crate::BLOCK_SIZES;

const POLYPHONY: &[usize] = &[1, 4, 16];

fn engine(block_size: usize, executor: Box<dyn ParallelExecutor>) -> Engine {
    let config = EngineConfig {
        block_size,
        ..EngineConfig::default().with_seed(1)
    };
    match Engine::with_executor(config, executor) {
        Ok(engine) => engine,
        Err(err) => panic!("bench engine: {err}"),
    }
}

fn keep_sounding(engine: &mut Engine, voices: usize) {
    if engine.active_voice_count() < voices {
        engine.schedule(0, SynthMessage::AllNotesOff);
        for k in 0..voices {
            engine.schedule(
                0,
                SynthMessage::NoteOn {
                    note: 36 + (k as u8 * 3),
                    velocity: 100,
                },
            );
        }
    }
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        for &voices in POLYPHONY {
            let executors: [(&str, Box<dyn ParallelExecutor>); 2] = [
                ("sequential", Box::new(SequentialExecutor)),
                ("rayon", Box::new(RayonExecutor::new())),
            ];
            for (name, executor) in executors {
                let mut engine = engine(size, executor);
                keep_sounding(&mut engine, voices);
                // Step past the strike so the partial loop is in steady state
                for _ in 0..8 {
                    engine.render_block();
                }

                let id = BenchmarkId::new(format!("{name}/{voices}v"), size);
                group.bench_with_input(id, &size, |b, _| {
                    b.iter(|| {
                        keep_sounding(&mut engine, voices);
                        black_box(engine.render_block().peak());
                    })
                });
            }
        }
    }

    group.finish();
}
