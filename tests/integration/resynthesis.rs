//! End-to-end resynthesis tests
//!
//! A sine goes in, the engine learns its cycle and plays it back. The
//! checks look at the last half of each render, after the analyzers settle.

use crate::helpers::tolerances::*;
use crate::helpers::*;
use waveplug::prelude::*;

const SECONDS: usize = 2;

fn tail(samples: &[f32]) -> &[f32] {
    &samples[samples.len() / 2..]
}

fn sine_input(frequency: f32) -> Vec<f32> {
    generate_sine(
        frequency,
        0.5,
        TEST_SAMPLE_RATE,
        SECONDS * TEST_SAMPLE_RATE as usize,
    )
}

#[test]
fn test_resynthesizes_sine_pitch_and_level() {
    let (mut engine, _control) = test_engine_with_io(2, 2);
    let left = sine_input(220.0);
    let right = generate_silence(left.len());

    let (out_l, out_r) = render_stereo(&mut engine, &left, &right);

    let hz = estimate_frequency(tail(&out_l), TEST_SAMPLE_RATE).unwrap();
    if (hz - 220.0).abs() >= PITCH_EPSILON_HZ {
        let _ = save_wav("resynthesis_pitch.wav", &out_l, TEST_SAMPLE_RATE as u32);
    }
    assert!((hz - 220.0).abs() < PITCH_EPSILON_HZ, "tracked {hz} Hz");

    let level = peak(tail(&out_l));
    assert!((level - 0.5).abs() < 2.0 * LEVEL_EPSILON, "peak {level}");
    assert_silence(tail(&out_r), SILENCE_THRESHOLD);
}

#[test]
fn test_monitors_report_tracked_frequency() {
    let (mut engine, control) = test_engine_with_io(2, 2);
    let left = sine_input(220.0);
    let right = generate_silence(left.len());
    render_stereo(&mut engine, &left, &right);

    let pre = control.frequency_hz(Channel::First, false);
    let post = control.frequency_hz(Channel::First, true);
    assert!((pre - 220.0).abs() < PITCH_EPSILON_HZ, "pre {pre} Hz");
    assert!((post - 220.0).abs() < PITCH_EPSILON_HZ, "post {post} Hz");
    let amplitude = control.amplitude(Channel::First, false);
    assert!(amplitude > 0.3 && amplitude < 0.6, "amplitude {amplitude}");
    assert!(control.amplitude(Channel::Second, false) < SILENCE_THRESHOLD);
}

#[test]
fn test_frequency_gain_doubles_pitch() {
    let (mut engine, control) = test_engine();
    control.set_parameter(Channel::First, ParamId::FreqGain, 0.75);

    let output = render_mono(&mut engine, &sine_input(220.0));

    let hz = estimate_frequency(tail(&output), TEST_SAMPLE_RATE).unwrap();
    assert!((hz - 440.0).abs() < 2.0 * PITCH_EPSILON_HZ, "tracked {hz} Hz");
}

#[test]
fn test_amplitude_gain_halves_level() {
    let (mut engine, control) = test_engine();
    control.set_parameter(Channel::First, ParamId::AmpGain, 0.25);

    let output = render_mono(&mut engine, &sine_input(220.0));

    let level = peak(tail(&output));
    assert!((level - 0.25).abs() < LEVEL_EPSILON, "peak {level}");
}

#[test]
fn test_smoothing_window_keeps_pitch_and_level() {
    let (mut engine, control) = test_engine();
    control.set_parameter(Channel::First, ParamId::SmoothingWindow, 0.2);

    let output = render_mono(&mut engine, &sine_input(220.0));

    let hz = estimate_frequency(tail(&output), TEST_SAMPLE_RATE).unwrap();
    assert!((hz - 220.0).abs() < PITCH_EPSILON_HZ, "tracked {hz} Hz");
    let level = peak(tail(&output));
    assert!((level - 0.5).abs() < 2.0 * LEVEL_EPSILON, "peak {level}");
}
