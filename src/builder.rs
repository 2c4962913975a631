//! Builder for configuring and constructing a `WaveEngine`.

use crate::config::EngineConfig;
use crate::{ControlHandle, Result, WaveEngine};
use waveplug_core::BufferPool;

/// Allocates every analyzer and synthesizer buffer up front, applies the
/// default parameter set to both channels and hands back the engine together
/// with its first [`ControlHandle`].
///
/// # Example
///
/// ```ignore
/// use waveplug::prelude::*;
///
/// let (engine, control) = WaveEngine::builder()
///     .sample_rate(48000.0)
///     .buffer_size_multiplier(8)
///     .inputs(2)
///     .outputs(2)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct WaveEngineBuilder {
    sample_rate: f32,
    buffer_size_multiplier: u32,
    inputs: usize,
    outputs: usize,
    pool_limit_bytes: Option<usize>,
}

impl Default for WaveEngineBuilder {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            sample_rate: config.sample_rate,
            buffer_size_multiplier: config.buffer_size_multiplier,
            inputs: config.inputs,
            outputs: config.outputs,
            pool_limit_bytes: None,
        }
    }
}

impl WaveEngineBuilder {
    /// Default: 44100
    pub fn sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Power of two in 1..=128. Default: 4
    pub fn buffer_size_multiplier(mut self, multiplier: u32) -> Self {
        self.buffer_size_multiplier = multiplier;
        self
    }

    /// Default: 1
    pub fn inputs(mut self, count: usize) -> Self {
        self.inputs = count;
        self
    }

    /// Default: 1
    pub fn outputs(mut self, count: usize) -> Self {
        self.outputs = count;
        self
    }

    /// Caps the bytes the engine's buffer pool hands out. Default: unlimited
    pub fn pool_limit_bytes(mut self, limit: usize) -> Self {
        self.pool_limit_bytes = Some(limit);
        self
    }

    /// Takes every setting except the pool limit from `config`.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.sample_rate = config.sample_rate;
        self.buffer_size_multiplier = config.buffer_size_multiplier;
        self.inputs = config.inputs;
        self.outputs = config.outputs;
        self
    }

    pub fn build(self) -> Result<(WaveEngine, ControlHandle)> {
        let config = EngineConfig {
            sample_rate: self.sample_rate,
            buffer_size_multiplier: self.buffer_size_multiplier,
            inputs: self.inputs,
            outputs: self.outputs,
        };
        config.validate()?;

        let pool = match self.pool_limit_bytes {
            Some(limit) => BufferPool::with_limit(limit),
            None => BufferPool::new(),
        };
        WaveEngine::new(config, pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_builder_defaults() {
        let (engine, _control) = WaveEngineBuilder::default().build().unwrap();
        assert_eq!(engine.config(), EngineConfig::default());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = WaveEngine::builder().buffer_size_multiplier(6).build();
        assert!(matches!(
            result,
            Err(Error::Core(waveplug_core::Error::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_pool_limit_too_small() {
        let result = WaveEngine::builder().pool_limit_bytes(4096).build();
        assert!(matches!(
            result,
            Err(Error::Core(waveplug_core::Error::AllocationFailed { .. }))
        ));
    }

    #[test]
    fn test_from_config() {
        let config = EngineConfig {
            sample_rate: 96000.0,
            buffer_size_multiplier: 1,
            inputs: 2,
            outputs: 1,
        };
        let (engine, control) = WaveEngine::builder().config(config).build().unwrap();
        assert_eq!(engine.config(), config);
        assert_eq!(control.sample_rate(), 96000.0);
        assert_eq!(control.buffer_size_multiplier(), 1);
    }
}
