//! Normalized parameters and their transforms.
//!
//! Hosts send every parameter as a value in [0, 1]. The functions in
//! [`transform`] map those values onto the ranges the analyzers, modulators
//! and synthesizers expect.

use waveplug_core::{Channel, Error, Result};
use waveplug_dsp::{FunctionModulation, SignedModulation, UnsignedModulation};

/// Per-channel parameter. Each channel of the pair has its own copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    AttackLag,
    DecayLag,
    AmpGate,
    SampleGate,
    HighTrigger,
    LowTrigger,
    MinFrequency,
    MaxFrequency,
    FrequencyLag,
    WaveLag,
    InvertTrigger,
    Interpolation,
    AmpModType,
    AmpModMix,
    FreqModType,
    FreqModMix,
    WaveModType,
    WaveModMix,
    AmpOffset,
    AmpGain,
    FreqOffset,
    FreqGain,
    Oversampling,
    SmoothingWindow,
    OutputModType,
    OutputModMix,
}

impl ParamId {
    pub const COUNT: usize = 26;

    pub const ALL: [ParamId; Self::COUNT] = [
        ParamId::AttackLag,
        ParamId::DecayLag,
        ParamId::AmpGate,
        ParamId::SampleGate,
        ParamId::HighTrigger,
        ParamId::LowTrigger,
        ParamId::MinFrequency,
        ParamId::MaxFrequency,
        ParamId::FrequencyLag,
        ParamId::WaveLag,
        ParamId::InvertTrigger,
        ParamId::Interpolation,
        ParamId::AmpModType,
        ParamId::AmpModMix,
        ParamId::FreqModType,
        ParamId::FreqModMix,
        ParamId::WaveModType,
        ParamId::WaveModMix,
        ParamId::AmpOffset,
        ParamId::AmpGain,
        ParamId::FreqOffset,
        ParamId::FreqGain,
        ParamId::Oversampling,
        ParamId::SmoothingWindow,
        ParamId::OutputModType,
        ParamId::OutputModMix,
    ];

    const NAMES: [&'static str; Self::COUNT] = [
        "AIncLag", "ADecLag", "GatLvlA", "GatLvlS", "HiTrig", "LowTrig", "FMin", "FMax", "FLag",
        "WLag", "InvTrig", "Interp", "AModTyp", "AModMix", "FModTyp", "FModMix", "WModTyp",
        "WModMix", "AOffset", "AGain", "FOffset", "FGain", "Oversmp", "SmooWin", "OModTyp",
        "OModMix",
    ];

    const DEFAULTS: [f32; Self::COUNT] = [
        0.1, 0.8, 0.05, 0.75, 0.783, 0.217, 0.00055, 0.73, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 0.5, 0.5, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<ParamId> {
        Self::ALL.get(index).copied()
    }

    /// Short host-facing name, without the channel suffix.
    pub fn name(self) -> &'static str {
        Self::NAMES[self.index()]
    }

    /// Normalized value a freshly built engine starts from.
    pub fn default_value(self) -> f32 {
        Self::DEFAULTS[self.index()]
    }
}

impl TryFrom<usize> for ParamId {
    type Error = Error;

    fn try_from(index: usize) -> Result<Self> {
        ParamId::from_index(index).ok_or(Error::UnknownParameter(index))
    }
}

/// Parameter shared by both channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonoParam {
    BufferSize,
}

impl MonoParam {
    pub fn name(self) -> &'static str {
        match self {
            MonoParam::BufferSize => "BufrSize",
        }
    }

    pub fn default_value(self) -> f32 {
        match self {
            MonoParam::BufferSize => 2.0 / 7.0,
        }
    }
}

/// Parameter addressed by its position in a flat host list: the shared
/// buffer size first, then the first channel's set, then the second's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostParam {
    Mono(MonoParam),
    Channel(Channel, ParamId),
}

impl HostParam {
    pub const COUNT: usize = 1 + 2 * ParamId::COUNT;

    pub fn index(self) -> usize {
        match self {
            HostParam::Mono(MonoParam::BufferSize) => 0,
            HostParam::Channel(channel, id) => 1 + channel.index() * ParamId::COUNT + id.index(),
        }
    }

    pub fn from_index(index: usize) -> Result<HostParam> {
        match index {
            0 => Ok(HostParam::Mono(MonoParam::BufferSize)),
            i if i < Self::COUNT => {
                let i = i - 1;
                let channel = Channel::from_index(i / ParamId::COUNT)
                    .ok_or(Error::UnknownParameter(index))?;
                let id = ParamId::try_from(i % ParamId::COUNT)?;
                Ok(HostParam::Channel(channel, id))
            }
            _ => Err(Error::UnknownParameter(index)),
        }
    }

    /// Host-facing name, e.g. `FMin1` or `OModMix2`.
    pub fn name(self) -> String {
        match self {
            HostParam::Mono(param) => param.name().to_string(),
            HostParam::Channel(channel, id) => format!("{}{}", id.name(), channel.index() + 1),
        }
    }

    pub fn default_value(self) -> f32 {
        match self {
            HostParam::Mono(param) => param.default_value(),
            HostParam::Channel(_, id) => id.default_value(),
        }
    }
}

/// Normalized-value transforms.
pub mod transform {
    use super::*;

    /// `2^⌊7v + 0.5⌋`, i.e. 1 to 128.
    pub fn buffer_size_multiplier(v: f32) -> u32 {
        1 << (7.0 * v.clamp(0.0, 1.0) + 0.5) as u32
    }

    /// Normalized value that maps back onto `multiplier`.
    pub fn buffer_size_value(multiplier: u32) -> f32 {
        multiplier.max(1).trailing_zeros() as f32 / 7.0
    }

    pub fn attack_lag(v: f32) -> f32 {
        (9.0 * v + 1.0).log10().powf(0.2)
    }

    pub fn decay_lag(v: f32) -> f32 {
        (9.0 * v + 1.0).log10().powf(0.01)
    }

    /// Amplitude and sample gates, `(2^(12v) - 1) / 4095`.
    pub fn gate_level(v: f32) -> f32 {
        ((12.0 * v).exp2() - 1.0) / 4095.0
    }

    pub fn trigger_level(v: f32) -> f32 {
        3.0 * (v - 0.5)
    }

    /// Detectable frequency bound in hertz, 1 Hz to `max_frequency`.
    pub fn frequency_bound(v: f32, max_frequency: f32) -> f32 {
        (max_frequency - 1.0) * ((9.0 * v).exp2() - 1.0) / 511.0 + 1.0
    }

    /// Frequency and waveform lag.
    pub fn follow_lag(v: f32) -> f32 {
        (9.0 * v + 1.0).log10().powf(0.4)
    }

    pub fn toggle(v: f32) -> bool {
        v > 0.5
    }

    /// Index into a list of `count` modulation types.
    pub fn modulation_index(v: f32, count: usize) -> usize {
        ((0.999 * (v.max(0.0) * count as f32)) as usize).min(count.saturating_sub(1))
    }

    pub fn unsigned_modulation(v: f32) -> UnsignedModulation {
        UnsignedModulation::from_index(modulation_index(v, UnsignedModulation::ALL.len()))
            .unwrap_or_default()
    }

    pub fn signed_modulation(v: f32) -> SignedModulation {
        SignedModulation::from_index(modulation_index(v, SignedModulation::ALL.len()))
            .unwrap_or_default()
    }

    pub fn function_modulation(v: f32) -> FunctionModulation {
        FunctionModulation::from_index(modulation_index(v, FunctionModulation::ALL.len()))
            .unwrap_or_default()
    }

    pub fn amp_offset(v: f32) -> f32 {
        2.0 * (v - 0.5)
    }

    /// Amplitude and frequency gain: 0 to 1 on the lower half, 1 to 5000 on
    /// the upper half.
    pub fn gain(v: f32) -> f32 {
        if v > 0.5 {
            if v > 0.9999 {
                5000.0
            } else {
                1.0 / (2.0 * (1.0 - v))
            }
        } else {
            2.0 * v
        }
    }

    /// Frequency offset in unsigned units.
    pub fn freq_offset(v: f32) -> f32 {
        let magnitude = ((32.0 * (v - 0.5).abs()).exp2() - 1.0) / 65535.0;
        if v > 0.5 {
            magnitude
        } else {
            -magnitude
        }
    }

    pub fn oversampling(v: f32) -> usize {
        1 + (15.0 * v.max(0.0)) as usize
    }

    /// Smoothing window at 44.1 kHz, in samples.
    pub fn smoothing_window(v: f32) -> usize {
        (250.0 * v.max(0.0)) as usize
    }
}
