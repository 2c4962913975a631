//! # Resynthesize
//!
//! Run a WAV file (or a generated 220 Hz sine) through the engine and
//! write the resynthesized signal next to it.
//!
//! **Concepts:** Engine setup, control handle, block processing, monitoring
//!
//! ```bash
//! cargo run --example resynthesize -- input.wav output.wav
//! ```

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use waveplug::prelude::*;

const BLOCK_SIZE: usize = 256;

type DemoResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn read_input(path: Option<&str>) -> DemoResult<(Vec<f32>, u32)> {
    let Some(path) = path else {
        let sample_rate = 44100;
        let sine = (0..2 * sample_rate)
            .map(|i| 0.5 * (std::f32::consts::TAU * 220.0 * i as f32 / sample_rate as f32).sin())
            .collect();
        return Ok((sine, sample_rate));
    };

    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };
    // First channel only.
    let mono = samples.iter().step_by(channels).copied().collect();
    Ok((mono, spec.sample_rate))
}

fn main() -> DemoResult<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let (input, sample_rate) = read_input(args.get(1).map(String::as_str))?;
    let output_path = args.get(2).map_or("resynthesized.wav", String::as_str);

    let (mut engine, control) = WaveEngine::builder()
        .sample_rate(sample_rate as f32)
        .build()?;
    control.set_parameter(Channel::First, ParamId::SmoothingWindow, 0.1);

    let mut output = vec![0.0; input.len()];
    for (inp, out) in input.chunks(BLOCK_SIZE).zip(output.chunks_mut(BLOCK_SIZE)) {
        engine.process(&[inp], &mut [out], ProcessMode::Replace);
    }

    println!(
        "Tracked {:.2} Hz at amplitude {:.3}",
        control.frequency_hz(Channel::First, false),
        control.amplitude(Channel::First, false)
    );

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(output_path, spec)?;
    for s in output {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    println!("Wrote {output_path}");

    Ok(())
}
