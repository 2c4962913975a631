//! Benchmarks for the per-sample analysis and resynthesis path
//!
//! Run with: cargo bench -p waveplug-dsp --bench per_sample

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use waveplug_core::{BufferPool, RateConfig};
use waveplug_dsp::{Analyzer, AnalyzerConfig, AnalyzerSource, Synthesizer};

const BLOCK: usize = 512;

fn sine_block(hz: f32, sample_rate: f32) -> Vec<f32> {
    (0..BLOCK)
        .map(|n| 0.5 * (std::f32::consts::TAU * hz * n as f32 / sample_rate).sin())
        .collect()
}

fn bench_analyzer(c: &mut Criterion) {
    let rate = RateConfig::new(48000.0);
    let pool = BufferPool::new();
    let mut analyzer = Analyzer::new(rate, AnalyzerConfig::default());
    analyzer.set_buffer_size(&pool, 5442).unwrap();
    let input = sine_block(220.0, rate.sample_rate());

    c.bench_function("analyzer_add_sample_block", |b| {
        b.iter(|| {
            for &x in &input {
                analyzer.add_sample(black_box(x));
            }
            analyzer.frequency()
        })
    });
}

fn bench_resynthesis(c: &mut Criterion) {
    let mut group = c.benchmark_group("resynthesis_block");
    let rate = RateConfig::new(48000.0);
    let input = sine_block(220.0, rate.sample_rate());

    for oversampling in [1usize, 4, 16] {
        let pool = BufferPool::new();
        let mut analyzer = Analyzer::new(rate, AnalyzerConfig::default());
        analyzer.set_buffer_size(&pool, 5442).unwrap();
        let mut synth = Synthesizer::new(rate);
        synth.set_buffer_size(&pool, 5442).unwrap();
        synth.set_oversampling(oversampling);
        synth.set_smoothing_window(&pool, 50);

        group.bench_with_input(
            BenchmarkId::new("oversampling", oversampling),
            &oversampling,
            |b, _| {
                b.iter(|| {
                    let mut acc = 0.0f32;
                    for &x in &input {
                        analyzer.add_sample(x);
                        acc += synth.current();
                        synth.tick(&mut AnalyzerSource::new(&analyzer));
                    }
                    black_box(acc)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_analyzer, bench_resynthesis);
criterion_main!(benches);
