//! Engine configuration.

use serde::{Deserialize, Serialize};
use waveplug_core::{Error, RateConfig, Result};

/// Smallest and largest accepted host sample rates.
pub const SAMPLE_RATE_RANGE: (f32, f32) = (8000.0, 384000.0);

/// Largest buffer-size multiplier the parameter transform can produce.
pub const MAX_BUFFER_SIZE_MULTIPLIER: u32 = 128;

/// Static configuration of a [`crate::WaveEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub sample_rate: f32,
    /// Scales the base buffer size of 1250 samples at 44.1 kHz.
    pub buffer_size_multiplier: u32,
    pub inputs: usize,
    pub outputs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            buffer_size_multiplier: 4,
            inputs: 1,
            outputs: 1,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        validate_sample_rate(self.sample_rate)?;
        let m = self.buffer_size_multiplier;
        if !m.is_power_of_two() || m > MAX_BUFFER_SIZE_MULTIPLIER {
            return Err(Error::InvalidConfig(format!(
                "buffer_size_multiplier {m} must be a power of two in 1-{MAX_BUFFER_SIZE_MULTIPLIER}"
            )));
        }
        validate_io(self.inputs, self.outputs)
    }

    pub fn rate(&self) -> RateConfig {
        RateConfig::new(self.sample_rate)
    }
}

pub(crate) fn validate_sample_rate(sample_rate: f32) -> Result<()> {
    let (lo, hi) = SAMPLE_RATE_RANGE;
    if !(lo..=hi).contains(&sample_rate) {
        return Err(Error::InvalidConfig(format!(
            "sample_rate {sample_rate} out of range (8000-384000 Hz)"
        )));
    }
    Ok(())
}

pub(crate) fn validate_io(inputs: usize, outputs: usize) -> Result<()> {
    if !(1..=2).contains(&inputs) || !(1..=2).contains(&outputs) {
        return Err(Error::InvalidConfig(format!(
            "{inputs} inputs / {outputs} outputs not supported (1 or 2 each)"
        )));
    }
    Ok(())
}
