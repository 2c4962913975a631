//! Sample-rate snapshot shared by analyzers and synthesizers.
//!
//! Frequencies travel through the engine in *unsigned units*: hertz scaled by
//! the shortest representable period, so the highest frequency the engine
//! handles maps to 1.0. Each component holds its own copy of [`RateConfig`] and
//! only receives a new one at block-start reconfiguration.

use serde::{Deserialize, Serialize};

/// Reference sample rate. Lag weights, window sizes and buffer sizes are
/// specified at this rate and scaled to the running rate.
pub const STD_SAMPLE_RATE: f32 = 44100.0;

/// Highest frequency usable at `sample_rate`.
#[inline]
pub fn sample_rate_to_max_frequency(sample_rate: f32) -> f32 {
    (sample_rate - 100.0) / 2.0
}

/// Immutable rate configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateConfig {
    sample_rate: f32,
    max_frequency: f32,
    min_period: f32,
}

impl RateConfig {
    pub fn new(sample_rate: f32) -> Self {
        let max_frequency = sample_rate_to_max_frequency(sample_rate)
            .min(sample_rate_to_max_frequency(STD_SAMPLE_RATE));
        Self {
            sample_rate,
            max_frequency,
            min_period: 1.0 / max_frequency,
        }
    }

    #[inline]
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Frequency that maps to 1.0 in unsigned units.
    #[inline]
    pub fn max_frequency(&self) -> f32 {
        self.max_frequency
    }

    #[inline]
    pub fn hz_to_unsigned(&self, hz: f32) -> f32 {
        hz * self.min_period.min(1.0)
    }

    /// Never returns less than 1 Hz.
    #[inline]
    pub fn unsigned_to_hz(&self, value: f32) -> f32 {
        (value * self.max_frequency).max(1.0)
    }

    /// Exponent that makes per-sample lag weights rate independent.
    #[inline]
    pub fn weight_modifier(&self) -> f32 {
        STD_SAMPLE_RATE / self.sample_rate
    }

    /// Scales a sample count given at the reference rate.
    #[inline]
    pub fn scale_samples(&self, samples: usize) -> usize {
        ((samples as f32 * self.sample_rate) / STD_SAMPLE_RATE) as usize
    }
}

impl Default for RateConfig {
    fn default() -> Self {
        Self::new(STD_SAMPLE_RATE)
    }
}
