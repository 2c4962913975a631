//! The two cross-modulated channels of the effect.
//!
//! Each channel owns an analyzer and a synthesizer. Its amplitude, frequency
//! and waveform modulators read its own analyzer as input 1 and the other
//! channel's analyzer as input 2; its output modulator does the same with the
//! two synthesizers.

use crate::params::{transform, ParamId};
use waveplug_core::{
    BufferPool, Channel, RateConfig, Result, ScalarTap, SignalBus, WaveTap, Wavetable,
};
use waveplug_dsp::{
    Analyzer, AnalyzerConfig, FunctionModulator, SignedModulator, SynthSource, Synthesizer,
    UnsignedModulator,
};

/// Middle C, the reference octave for fine frequency modulation.
const FINE_TUNING_HZ: f32 = 261.63;

/// Buffer size at 44.1 kHz for a multiplier of 1.
pub const BASE_BUFFER_SIZE: f32 = 1250.0;

/// Samples of analyzer and synthesizer buffer for `multiplier` at `rate`.
pub fn buffer_size(multiplier: u32, rate: &RateConfig) -> usize {
    (multiplier as f32 * BASE_BUFFER_SIZE * rate.sample_rate() / waveplug_core::STD_SAMPLE_RATE)
        as usize
}

#[derive(Debug, Clone)]
struct Modulators {
    amplitude: UnsignedModulator,
    frequency: UnsignedModulator,
    wave: FunctionModulator,
    output: SignedModulator,
}

impl Modulators {
    fn new(channel: Channel, rate: RateConfig) -> Self {
        let other = channel.other();
        Self {
            amplitude: UnsignedModulator::new(
                ScalarTap::Amplitude(channel),
                ScalarTap::Amplitude(other),
                rate,
            ),
            frequency: UnsignedModulator::new(
                ScalarTap::Frequency(channel),
                ScalarTap::Frequency(other),
                rate,
            )
            .with_fine_tuning(
                rate.hz_to_unsigned(FINE_TUNING_HZ),
                UnsignedModulator::DEFAULT_FINE_BASE,
            ),
            wave: FunctionModulator::new(WaveTap::Wave(channel), WaveTap::Wave(other), rate),
            output: SignedModulator::new(ScalarTap::Audio(channel), ScalarTap::Audio(other), rate),
        }
    }

    fn set_rate(&mut self, rate: RateConfig) {
        self.amplitude.set_rate(rate);
        self.frequency.set_rate(rate);
        self.wave.set_rate(rate);
        self.output.set_rate(rate);
    }
}

/// Resolves taps against the pair's analyzers and a snapshot of the
/// synthesizer outputs.
struct PairBus<'a> {
    analyzers: &'a [Analyzer; 2],
    audio: [f32; 2],
}

impl SignalBus for PairBus<'_> {
    #[inline]
    fn scalar(&self, tap: ScalarTap) -> f32 {
        match tap {
            ScalarTap::Amplitude(ch) => self.analyzers[ch.index()].amplitude(),
            ScalarTap::Frequency(ch) => self.analyzers[ch.index()].frequency(),
            ScalarTap::Audio(ch) => self.audio[ch.index()],
        }
    }

    #[inline]
    fn wave(&self, tap: WaveTap) -> Wavetable<'_> {
        match tap {
            WaveTap::Wave(ch) => self.analyzers[ch.index()].wavetable(),
        }
    }
}

/// Feeds one synthesizer through its channel's modulators.
struct ModulatedSource<'m, 'b> {
    modulators: &'m mut Modulators,
    bus: &'b PairBus<'b>,
}

impl SynthSource for ModulatedSource<'_, '_> {
    #[inline]
    fn amplitude(&mut self) -> f32 {
        self.modulators.amplitude.value(self.bus)
    }

    #[inline]
    fn frequency(&mut self) -> f32 {
        self.modulators.frequency.value(self.bus)
    }

    #[inline]
    fn set_cycle_size(&mut self, samples: f32) {
        self.modulators.wave.set_cycle_size(samples);
    }

    #[inline]
    fn wave(&mut self, x: f32) -> f32 {
        self.modulators.wave.value(self.bus, x)
    }
}

/// Analyzers, modulators and synthesizers of both channels.
pub struct ChannelPair {
    rate: RateConfig,
    analyzers: [Analyzer; 2],
    synthesizers: [Synthesizer; 2],
    modulators: [Modulators; 2],
}

impl ChannelPair {
    /// Pair without buffers. Call [`ChannelPair::set_buffer_size`] before use.
    pub fn new(rate: RateConfig) -> Self {
        Self {
            rate,
            analyzers: [
                Analyzer::new(rate, AnalyzerConfig::default()),
                Analyzer::new(rate, AnalyzerConfig::default()),
            ],
            synthesizers: [Synthesizer::new(rate), Synthesizer::new(rate)],
            modulators: [
                Modulators::new(Channel::First, rate),
                Modulators::new(Channel::Second, rate),
            ],
        }
    }

    pub fn rate(&self) -> RateConfig {
        self.rate
    }

    /// Installs a new rate snapshot in every component and resets them.
    pub fn set_rate(&mut self, pool: &BufferPool, rate: RateConfig) {
        self.rate = rate;
        for analyzer in &mut self.analyzers {
            analyzer.set_rate(rate);
        }
        for synth in &mut self.synthesizers {
            synth.set_rate(pool, rate);
        }
        for modulators in &mut self.modulators {
            modulators.set_rate(rate);
        }
    }

    /// Analyzer capacity and synthesizer ring size.
    pub fn buffer_sizes(&self) -> (usize, usize) {
        (
            self.analyzers[0].capacity(),
            self.synthesizers[0].buffer_size(),
        )
    }

    /// Resizes all four components' buffers.
    ///
    /// Stops at the first failure, leaving the pair partly resized; the
    /// caller decides whether to roll back.
    pub fn set_buffer_sizes(&mut self, pool: &BufferPool, analyzer: usize, synth: usize) -> Result<()> {
        for a in &mut self.analyzers {
            a.set_buffer_size(pool, analyzer)?;
        }
        for s in &mut self.synthesizers {
            s.set_buffer_size(pool, synth)?;
        }
        Ok(())
    }

    /// Whether every component holds its buffers.
    pub fn is_allocated(&self) -> bool {
        self.analyzers.iter().all(Analyzer::is_allocated)
            && self.synthesizers.iter().all(Synthesizer::is_allocated)
    }

    pub fn release_buffers(&mut self, pool: &BufferPool) {
        for analyzer in &mut self.analyzers {
            analyzer.release_buffers(pool);
        }
        for synth in &mut self.synthesizers {
            synth.release_buffers(pool);
        }
    }

    pub fn reset(&mut self, pool: &BufferPool) {
        for analyzer in &mut self.analyzers {
            analyzer.reset();
        }
        for synth in &mut self.synthesizers {
            synth.reset(pool);
        }
    }

    pub fn analyzer(&self, channel: Channel) -> &Analyzer {
        &self.analyzers[channel.index()]
    }

    pub fn synthesizer(&self, channel: Channel) -> &Synthesizer {
        &self.synthesizers[channel.index()]
    }

    /// Applies one transformed parameter to `channel`'s components.
    pub fn apply(&mut self, pool: &BufferPool, channel: Channel, id: ParamId, v: f32) {
        use transform::*;

        let max_frequency = self.rate.max_frequency();
        let i = channel.index();
        let analyzer = &mut self.analyzers[i];
        let synth = &mut self.synthesizers[i];
        let mods = &mut self.modulators[i];

        match id {
            ParamId::AttackLag => analyzer.set_attack_lag(attack_lag(v)),
            ParamId::DecayLag => analyzer.set_decay_lag(decay_lag(v)),
            ParamId::AmpGate => analyzer.set_amp_gate(gate_level(v)),
            ParamId::SampleGate => analyzer.set_sample_gate(gate_level(v)),
            ParamId::HighTrigger => analyzer.set_high_trigger(trigger_level(v)),
            ParamId::LowTrigger => analyzer.set_low_trigger(trigger_level(v)),
            ParamId::MinFrequency => {
                analyzer.set_min_frequency(frequency_bound(v, max_frequency))
            }
            ParamId::MaxFrequency => {
                analyzer.set_max_frequency(frequency_bound(v, max_frequency))
            }
            ParamId::FrequencyLag => analyzer.set_frequency_lag(follow_lag(v)),
            ParamId::WaveLag => analyzer.set_wave_lag(follow_lag(v)),
            ParamId::InvertTrigger => analyzer.set_inverted(toggle(v)),
            ParamId::Interpolation => analyzer.set_interpolation(toggle(v)),
            ParamId::AmpModType => mods.amplitude.set_modulation(unsigned_modulation(v)),
            ParamId::AmpModMix => mods.amplitude.set_mix(v),
            ParamId::FreqModType => mods.frequency.set_modulation(unsigned_modulation(v)),
            ParamId::FreqModMix => mods.frequency.set_mix(v),
            ParamId::WaveModType => mods.wave.set_modulation(function_modulation(v)),
            ParamId::WaveModMix => mods.wave.set_mix(v),
            ParamId::AmpOffset => synth.set_amp_offset(amp_offset(v)),
            ParamId::AmpGain => synth.set_amp_gain(gain(v)),
            ParamId::FreqOffset => synth.set_freq_offset(freq_offset(v)),
            ParamId::FreqGain => synth.set_freq_gain(gain(v)),
            ParamId::Oversampling => synth.set_oversampling(oversampling(v)),
            ParamId::SmoothingWindow => synth.set_smoothing_window(pool, smoothing_window(v)),
            ParamId::OutputModType => mods.output.set_modulation(signed_modulation(v)),
            ParamId::OutputModMix => mods.output.set_mix(v),
        }
    }

    /// Feeds one input sample to each analyzer.
    #[inline]
    pub fn analyze(&mut self, first: f32, second: f32) {
        self.analyzers[0].add_sample(first);
        self.analyzers[1].add_sample(second);
    }

    /// Output of `channel`'s output modulator at the current read position.
    #[inline]
    pub fn output(&mut self, channel: Channel) -> f32 {
        let bus = PairBus {
            analyzers: &self.analyzers,
            audio: [
                self.synthesizers[0].current(),
                self.synthesizers[1].current(),
            ],
        };
        self.modulators[channel.index()].output.value(&bus)
    }

    /// Advances both synthesizers by one sample.
    #[inline]
    pub fn tick(&mut self) {
        let bus = PairBus {
            analyzers: &self.analyzers,
            audio: [
                self.synthesizers[0].current(),
                self.synthesizers[1].current(),
            ],
        };
        for (synth, modulators) in self.synthesizers.iter_mut().zip(self.modulators.iter_mut()) {
            synth.tick(&mut ModulatedSource {
                modulators,
                bus: &bus,
            });
        }
    }
}

impl std::fmt::Debug for ChannelPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (analyzer, synth) = self.buffer_sizes();
        f.debug_struct("ChannelPair")
            .field("sample_rate", &self.rate.sample_rate())
            .field("analyzer_capacity", &analyzer)
            .field("synth_buffer_size", &synth)
            .finish()
    }
}
