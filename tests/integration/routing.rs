//! Channel layout and output mode tests

use crate::helpers::tolerances::*;
use crate::helpers::*;
use waveplug::prelude::*;

fn seconds(n: f32) -> usize {
    (n * TEST_SAMPLE_RATE) as usize
}

fn tail(samples: &[f32]) -> &[f32] {
    &samples[samples.len() / 2..]
}

#[test]
fn test_bypass_passes_input_through() {
    let (mut engine, control) = test_engine_with_io(2, 2);
    control.set_bypass(true);

    let left = generate_sine(220.0, 0.5, TEST_SAMPLE_RATE, 4096);
    let right = generate_noise(4096, 3);
    let (out_l, out_r) = render_stereo(&mut engine, &left, &right);

    for (a, b) in out_l.iter().zip(&left).chain(out_r.iter().zip(&right)) {
        assert!((a - b).abs() <= FLOAT_EPSILON);
    }
    assert!(engine.routing().bypass);
}

#[test]
fn test_stereo_channels_track_their_own_input() {
    let (mut engine, _control) = test_engine_with_io(2, 2);
    let left = generate_sine(220.0, 0.5, TEST_SAMPLE_RATE, seconds(2.0));
    let right = generate_sine(330.0, 0.5, TEST_SAMPLE_RATE, seconds(2.0));

    let (out_l, out_r) = render_stereo(&mut engine, &left, &right);

    let hz_l = estimate_frequency(tail(&out_l), TEST_SAMPLE_RATE).unwrap();
    let hz_r = estimate_frequency(tail(&out_r), TEST_SAMPLE_RATE).unwrap();
    assert!((hz_l - 220.0).abs() < PITCH_EPSILON_HZ, "left {hz_l} Hz");
    assert!((hz_r - 330.0).abs() < PITCH_EPSILON_HZ, "right {hz_r} Hz");
}

#[test]
fn test_output_mix_takes_other_channel() {
    let (mut engine, control) = test_engine_with_io(2, 2);
    control.set_parameter(Channel::Second, ParamId::OutputModMix, 1.0);

    let left = generate_sine(220.0, 0.5, TEST_SAMPLE_RATE, seconds(2.0));
    let right = generate_silence(left.len());
    let (_, out_r) = render_stereo(&mut engine, &left, &right);

    let hz = estimate_frequency(tail(&out_r), TEST_SAMPLE_RATE).unwrap();
    assert!((hz - 220.0).abs() < PITCH_EPSILON_HZ, "right {hz} Hz");
}

#[test]
fn test_single_input_feeds_both_channels() {
    let (mut engine, _control) = test_engine_with_io(1, 2);
    let input = generate_sine(220.0, 0.5, TEST_SAMPLE_RATE, seconds(2.0));
    let mut out_l = vec![0.0; input.len()];
    let mut out_r = vec![0.0; input.len()];

    for ((inp, ol), or) in input
        .chunks(TEST_BUFFER_SIZE)
        .zip(out_l.chunks_mut(TEST_BUFFER_SIZE))
        .zip(out_r.chunks_mut(TEST_BUFFER_SIZE))
    {
        engine.process(&[inp], &mut [ol, or], ProcessMode::Replace);
    }

    assert_has_audio(tail(&out_l), 0.1);
    assert_has_audio(tail(&out_r), 0.1);
    let hz = estimate_frequency(tail(&out_r), TEST_SAMPLE_RATE).unwrap();
    assert!((hz - 220.0).abs() < PITCH_EPSILON_HZ, "right {hz} Hz");
}

#[test]
fn test_accumulate_adds_to_output() {
    let (mut engine, control) = test_engine();
    control.set_bypass(true);

    let input = generate_sine(220.0, 0.25, TEST_SAMPLE_RATE, TEST_BUFFER_SIZE);
    let mut output = vec![0.5; TEST_BUFFER_SIZE];
    let frames = engine.process(
        &[input.as_slice()],
        &mut [output.as_mut_slice()],
        ProcessMode::Accumulate,
    );

    assert_eq!(frames, TEST_BUFFER_SIZE);
    for (o, i) in output.iter().zip(&input) {
        assert!((o - (0.5 + i)).abs() <= FLOAT_EPSILON);
    }
}

#[test]
fn test_io_change_applies_on_next_block() {
    let (mut engine, control) = test_engine();
    control.set_io(2, 2).unwrap();
    assert!(control.set_io(3, 1).is_err());

    let input = generate_silence(64);
    let mut out = vec![0.0; 64];
    let frames = engine.process(
        &[input.as_slice()],
        &mut [out.as_mut_slice()],
        ProcessMode::Replace,
    );
    assert_eq!(frames, 0);
    assert_eq!(engine.routing().inputs, 2);
    assert_eq!(engine.routing().outputs, 2);
}

#[test]
fn test_shortest_buffer_sets_block_length() {
    let (mut engine, _control) = test_engine_with_io(2, 2);
    let left = generate_silence(128);
    let right = generate_silence(96);
    let mut out_l = vec![1.0; 128];
    let mut out_r = vec![1.0; 128];

    let frames = engine.process(
        &[left.as_slice(), right.as_slice()],
        &mut [out_l.as_mut_slice(), out_r.as_mut_slice()],
        ProcessMode::Replace,
    );

    assert_eq!(frames, 96);
    assert_eq!(out_l[96..], [1.0; 32]);
}
