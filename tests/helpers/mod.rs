//! Test helpers and fixtures for WavePlug integration tests
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (bypass, accumulate)
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)
//! - `PITCH_EPSILON_HZ` (1.5): Frequency tracking
//! - `LEVEL_EPSILON` (0.06): Resynthesized peak levels

#![allow(dead_code)]

pub mod tolerances;

use std::path::PathBuf;
use waveplug::{ControlHandle, ProcessMode, WaveEngine};

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: f32 = 48000.0;

/// Block size used to drive the engine
pub const TEST_BUFFER_SIZE: usize = 512;

/// Mono-in, mono-out engine at [`TEST_SAMPLE_RATE`].
pub fn test_engine() -> (WaveEngine, ControlHandle) {
    test_engine_with_io(1, 1)
}

pub fn test_engine_with_io(inputs: usize, outputs: usize) -> (WaveEngine, ControlHandle) {
    WaveEngine::builder()
        .sample_rate(TEST_SAMPLE_RATE)
        .inputs(inputs)
        .outputs(outputs)
        .build()
        .expect("Failed to create test engine")
}

/// Generate a sine wave at given frequency and amplitude.
pub fn generate_sine(
    frequency: f32,
    amplitude: f32,
    sample_rate: f32,
    num_samples: usize,
) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (amplitude as f64 * (2.0 * std::f64::consts::PI * frequency as f64 * t).sin()) as f32
        })
        .collect()
}

/// Generate silence (zero samples).
pub fn generate_silence(num_samples: usize) -> Vec<f32> {
    vec![0.0; num_samples]
}

/// Generate white noise (random samples in -1..1).
pub fn generate_noise(num_samples: usize, seed: u64) -> Vec<f32> {
    // Simple LCG for reproducible "random" noise
    let mut rng = seed;
    (0..num_samples)
        .map(|_| {
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((rng >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Estimate frequency from upward crossings of 30% of the peak level.
///
/// The detector re-arms only after the signal falls below the negative
/// level, so seams near zero cannot add spurious crossings.
pub fn estimate_frequency(samples: &[f32], sample_rate: f32) -> Option<f32> {
    let level = 0.3 * peak(samples);
    let mut armed = false;
    let mut crossings = Vec::new();
    for (i, w) in samples.windows(2).enumerate() {
        if w[1] < -level {
            armed = true;
        }
        if armed && w[0] < level && w[1] >= level {
            crossings.push(i as f32 + (level - w[0]) / (w[1] - w[0]));
            armed = false;
        }
    }
    if crossings.len() < 2 {
        return None;
    }
    let span = crossings[crossings.len() - 1] - crossings[0];
    Some(sample_rate * (crossings.len() - 1) as f32 / span)
}

/// Runs `input` through the engine block by block, one input and one output.
pub fn render_mono(engine: &mut WaveEngine, input: &[f32]) -> Vec<f32> {
    let mut output = vec![0.0; input.len()];
    for (inp, out) in input
        .chunks(TEST_BUFFER_SIZE)
        .zip(output.chunks_mut(TEST_BUFFER_SIZE))
    {
        engine.process(&[inp], &mut [out], ProcessMode::Replace);
    }
    output
}

/// Runs two inputs through the engine into two outputs.
pub fn render_stereo(
    engine: &mut WaveEngine,
    left: &[f32],
    right: &[f32],
) -> (Vec<f32>, Vec<f32>) {
    let mut out_l = vec![0.0; left.len()];
    let mut out_r = vec![0.0; right.len()];
    let blocks = left
        .chunks(TEST_BUFFER_SIZE)
        .zip(right.chunks(TEST_BUFFER_SIZE))
        .zip(out_l.chunks_mut(TEST_BUFFER_SIZE))
        .zip(out_r.chunks_mut(TEST_BUFFER_SIZE));
    for (((l, r), ol), or) in blocks {
        engine.process(&[l, r], &mut [ol, or], ProcessMode::Replace);
    }
    (out_l, out_r)
}

/// Assert that a signal is approximately silent (all values near zero).
pub fn assert_silence(samples: &[f32], tolerance: f32) {
    let max = peak(samples);
    assert!(
        max <= tolerance,
        "Expected silence, but peak amplitude was {}",
        max
    );
}

/// Assert that a signal has content (not silent).
pub fn assert_has_audio(samples: &[f32], min_rms: f32) {
    let r = rms(samples);
    assert!(
        r >= min_rms,
        "Expected audio content with RMS >= {}, but RMS was {}",
        min_rms,
        r
    );
}

/// Get path to the directory debug renders are written to.
pub fn test_output_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("renders")
}

/// Write a mono float WAV for listening to a failing render.
pub fn save_wav(name: &str, samples: &[f32], sample_rate: u32) -> Result<PathBuf, String> {
    use hound::{WavSpec, WavWriter};

    let dir = test_output_dir();
    std::fs::create_dir_all(&dir).map_err(|e| e.to_string())?;
    let path = dir.join(name);

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&path, spec).map_err(|e| e.to_string())?;
    for &s in samples {
        writer.write_sample(s).map_err(|e| e.to_string())?;
    }
    writer.finalize().map_err(|e| e.to_string())?;
    Ok(path)
}
