use dulcimer::{
    render::SequentialExecutor,
    synth::{Param, SynthMessage},
    Engine, EngineConfig,
};
use rustfft::{num_complex::Complex, FftPlanner};

const SAMPLE_RATE: f64 = 44_100.0;
const FFT_LEN: usize = 16_384;

/// Mono render of `note`, skipping the first 0.1 s.
fn render_note(note: u8, inharmonicity: f64) -> Vec<f32> {
    let config = EngineConfig {
        noisy_transient: false,
        ..EngineConfig::default().with_seed(2024)
    };
    let mut engine = Engine::with_executor(config, Box::new(SequentialExecutor)).unwrap();
    engine.parameters().set(Param::Inharmonicity, inharmonicity);
    engine.schedule(0, SynthMessage::NoteOn { note, velocity: 100 });

    let skip = (0.1 * SAMPLE_RATE) as usize;
    let mut left = vec![0.0; skip + FFT_LEN];
    let mut right = vec![0.0; skip + FFT_LEN];
    engine.process(&mut left, &mut right);
    left[skip..]
        .iter()
        .zip(&right[skip..])
        .map(|(l, r)| l + r)
        .collect()
}

/// Hann-windowed magnitude spectrum.
fn spectrum(samples: &[f32]) -> Vec<f64> {
    let n = samples.len();
    let mut buffer: Vec<Complex<f64>> = samples
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let w = 0.5 - 0.5 * (std::f64::consts::TAU * i as f64 / n as f64).cos();
            Complex::new(s as f64 * w, 0.0)
        })
        .collect();
    FftPlanner::new().plan_fft_forward(n).process(&mut buffer);
    buffer[..n / 2].iter().map(|c| c.norm()).collect()
}

fn bin_to_hz(bin: usize) -> f64 {
    bin as f64 * SAMPLE_RATE / FFT_LEN as f64
}

/// Frequency of the strongest bin between `lo` and `hi` Hz.
fn peak_between(mags: &[f64], lo: f64, hi: f64) -> f64 {
    let lo_bin = (lo * FFT_LEN as f64 / SAMPLE_RATE) as usize;
    let hi_bin = (hi * FFT_LEN as f64 / SAMPLE_RATE) as usize;
    let (bin, _) = mags[lo_bin..hi_bin]
        .iter()
        .enumerate()
        .fold((0, 0.0), |best, (i, &m)| if m > best.1 { (i, m) } else { best });
    bin_to_hz(lo_bin + bin)
}

#[test]
fn middle_c_fundamental_dominates() {
    let mags = spectrum(&render_note(60, 0.003));
    let peak = peak_between(&mags, 20.0, 5_000.0);
    // 261.63 Hz stretched by sqrt(1 + B)
    let expected = 261.63 * (1.0_f64 + 0.003).sqrt();
    assert!(
        (peak - expected).abs() < expected * 0.01,
        "peak at {peak:.1} Hz, expected about {expected:.1} Hz"
    );
}

#[test]
fn stiff_string_partials_run_sharp() {
    let b = 0.05;
    let f0 = 220.0;
    let mags = spectrum(&render_note(57, b));
    let first = peak_between(&mags, f0 * 0.8, f0 * 1.5);
    let second = peak_between(&mags, f0 * 1.6, f0 * 2.8);
    let expected = 2.0 * ((1.0 + 4.0 * b) / (1.0 + b)).sqrt();
    let ratio = second / first;
    assert!(ratio > 2.05, "partials look harmonic: ratio {ratio:.3}");
    assert!((ratio - expected).abs() < 0.05, "ratio {ratio:.3}, expected {expected:.3}");
}
