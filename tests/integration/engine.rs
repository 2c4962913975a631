//! Engine lifecycle integration tests
//!
//! Construction, reset, sample-rate changes and recovery from lost buffers.

use crate::helpers::tolerances::*;
use crate::helpers::*;
use waveplug::prelude::*;
use waveplug::HostParam;

#[test]
fn test_engine_builds_with_defaults() {
    let (engine, control) = test_engine();

    assert!(engine.is_operational());
    assert!(control.is_operational());
    assert_eq!(engine.sample_rate(), TEST_SAMPLE_RATE);
    assert_eq!(control.buffer_size_multiplier(), 4);
    for id in ParamId::ALL {
        assert_eq!(control.parameter(Channel::First, id), id.default_value());
        assert_eq!(control.parameter(Channel::Second, id), id.default_value());
    }
}

#[test]
fn test_silence_in_silence_out() {
    let (mut engine, _control) = test_engine();
    let output = render_mono(&mut engine, &generate_silence(TEST_SAMPLE_RATE as usize));
    assert_silence(&output, SILENCE_THRESHOLD);
}

#[test]
fn test_noise_stays_bounded() {
    let (mut engine, _control) = test_engine();
    let output = render_mono(&mut engine, &generate_noise(TEST_SAMPLE_RATE as usize, 7));
    assert!(output.iter().all(|x| x.is_finite()));
    assert!(peak(&output) < 2.0);
}

#[test]
fn test_reset_forgets_the_last_cycle() {
    let (mut engine, control) = test_engine();
    let sine = generate_sine(220.0, 0.5, TEST_SAMPLE_RATE, TEST_SAMPLE_RATE as usize);
    let output = render_mono(&mut engine, &sine);
    assert_has_audio(&output[output.len() / 2..], 0.1);

    control.reset();
    let output = render_mono(&mut engine, &generate_silence(8 * TEST_BUFFER_SIZE));
    assert_silence(&output, SILENCE_THRESHOLD);
}

#[test]
fn test_tracks_pitch_after_sample_rate_change() {
    let (mut engine, control) = test_engine();
    control.set_sample_rate(96000.0).unwrap();

    let sine = generate_sine(330.0, 0.5, 96000.0, 96000);
    let output = render_mono(&mut engine, &sine);
    assert_eq!(engine.sample_rate(), 96000.0);
    assert_eq!(engine.pair().buffer_sizes().0, 10884);

    let hz = estimate_frequency(&output[48000..], 96000.0).unwrap();
    assert!((hz - 330.0).abs() < PITCH_EPSILON_HZ * 2.0, "tracked {hz} Hz");
}

#[test]
fn test_recovers_after_buffer_loss() {
    let (mut engine, control) = test_engine();

    engine.pool().set_limit(Some(1024));
    control.set_buffer_size_multiplier(16);
    let output = render_mono(&mut engine, &generate_sine(220.0, 0.5, TEST_SAMPLE_RATE, 4096));
    assert!(!control.is_operational());
    assert!(control.ensure_operational().is_err());
    assert_silence(&output, 0.0);

    engine.pool().set_limit(None);
    control.set_buffer_size_multiplier(4);
    let sine = generate_sine(220.0, 0.5, TEST_SAMPLE_RATE, TEST_SAMPLE_RATE as usize);
    let output = render_mono(&mut engine, &sine);
    assert!(control.is_operational());
    assert_has_audio(&output[output.len() / 2..], 0.1);
}

#[test]
fn test_host_parameter_indices() {
    let (mut engine, control) = test_engine();
    let index = HostParam::Channel(Channel::Second, ParamId::FreqGain).index();
    control.set_host_parameter(index, 0.75).unwrap();
    assert!(control.set_host_parameter(HostParam::COUNT, 0.5).is_err());

    render_mono(&mut engine, &generate_silence(16));
    assert_eq!(control.host_parameter(index).unwrap(), 0.75);
    assert_eq!(engine.pair().synthesizer(Channel::Second).freq_gain(), 2.0);
}
