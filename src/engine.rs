//! WaveEngine: the audio-thread half of the effect

use crate::config::EngineConfig;
use crate::control::{ControlHandle, PendingUpdates, Routing, Shared};
use crate::handler::{self, Handler, ProcessMode};
use crate::pair::{buffer_size, ChannelPair};
use crate::params::{transform, ParamId};
use crate::Result;
use waveplug_core::compat::Arc;
use waveplug_core::{BufferPool, Channel, RateConfig};

/// Two-channel pitch-tracking resynthesis effect.
///
/// The engine owns all processing state and is driven from the audio thread
/// through [`WaveEngine::process`]. Every other thread talks to it through
/// the [`ControlHandle`] returned by the builder.
///
/// # Example
///
/// ```ignore
/// use waveplug::prelude::*;
///
/// let (mut engine, control) = WaveEngine::builder()
///     .sample_rate(48000.0)
///     .inputs(1)
///     .outputs(2)
///     .build()?;
///
/// control.set_parameter(Channel::Second, ParamId::FreqGain, 0.75);
///
/// engine.process(&[&input], &mut [&mut left, &mut right], ProcessMode::Replace);
/// ```
pub struct WaveEngine {
    /// Analyzers, modulators and synthesizers of both channels
    pair: ChannelPair,

    /// Source of every sample buffer the pair holds
    pool: BufferPool,

    /// Pending updates, applied parameters and monitoring values
    shared: Arc<Shared>,

    routing: Routing,
    buffer_size_multiplier: u32,
    operational: bool,

    /// Current handler per [`ProcessMode`]
    handlers: [Handler; 2],
}

impl WaveEngine {
    /// Create a new engine builder
    pub fn builder() -> crate::WaveEngineBuilder {
        crate::WaveEngineBuilder::default()
    }

    /// Builds an engine from a validated configuration. Fails if the
    /// initial buffers cannot be allocated from `pool`.
    pub(crate) fn new(config: EngineConfig, pool: BufferPool) -> Result<(Self, ControlHandle)> {
        let rate = config.rate();
        let routing = Routing {
            inputs: config.inputs,
            outputs: config.outputs,
            bypass: false,
        };
        let shared = Arc::new(Shared::new(routing, config.sample_rate));

        let mut engine = Self {
            pair: ChannelPair::new(rate),
            pool,
            shared: Arc::clone(&shared),
            routing,
            buffer_size_multiplier: config.buffer_size_multiplier,
            operational: false,
            handlers: [handler::select(routing, ProcessMode::Replace, false); 2],
        };

        let size = buffer_size(config.buffer_size_multiplier, &rate);
        if let Err(err) = engine.pair.set_buffer_sizes(&engine.pool, size, size) {
            tracing::error!(%err, size, "initial buffer allocation failed");
            engine.pair.release_buffers(&engine.pool);
            return Err(err.into());
        }
        engine.shared.buffer_size_multiplier.set(config.buffer_size_multiplier);
        engine
            .shared
            .buffer_size
            .set(transform::buffer_size_value(config.buffer_size_multiplier));

        for channel in Channel::ALL {
            for id in ParamId::ALL {
                engine
                    .pair
                    .apply(&engine.pool, channel, id, id.default_value());
            }
        }
        engine.set_operational(true);

        tracing::info!(
            sample_rate = config.sample_rate,
            multiplier = config.buffer_size_multiplier,
            inputs = config.inputs,
            outputs = config.outputs,
            "wave engine built"
        );
        Ok((engine, ControlHandle::new(shared)))
    }

    /// Another handle to this engine's control state.
    pub fn control(&self) -> ControlHandle {
        ControlHandle::new(Arc::clone(&self.shared))
    }

    /// Processes one block.
    ///
    /// Staged control updates are applied first, unless the control thread
    /// holds the update lock, in which case they wait for the next block.
    /// The block length is the shortest buffer the current routing uses.
    /// Returns the number of frames rendered; 0 if fewer buffers than the
    /// routing needs were passed.
    pub fn process(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
        mode: ProcessMode,
    ) -> usize {
        self.apply_pending();

        let (n_in, n_out) = (self.routing.inputs, self.routing.outputs);
        if inputs.len() < n_in || outputs.len() < n_out {
            return 0;
        }
        let frames = inputs[..n_in]
            .iter()
            .map(|b| b.len())
            .chain(outputs[..n_out].iter().map(|b| b.len()))
            .min()
            .unwrap_or(0);

        (self.handlers[mode.index()])(&mut self.pair, inputs, outputs, frames);

        if self.operational {
            self.publish_monitors();
        }
        frames
    }

    pub fn sample_rate(&self) -> f32 {
        self.pair.rate().sample_rate()
    }

    pub fn buffer_size_multiplier(&self) -> u32 {
        self.buffer_size_multiplier
    }

    pub fn routing(&self) -> Routing {
        self.routing
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    /// Current configuration, as applied.
    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            sample_rate: self.sample_rate(),
            buffer_size_multiplier: self.buffer_size_multiplier,
            inputs: self.routing.inputs,
            outputs: self.routing.outputs,
        }
    }

    /// Read access to the processing components.
    pub fn pair(&self) -> &ChannelPair {
        &self.pair
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    fn apply_pending(&mut self) {
        let update = match self.shared.pending.try_lock() {
            Some(mut pending) => pending.take(),
            None => return,
        };
        self.apply(update);
    }

    fn apply(&mut self, update: PendingUpdates) {
        if let Some(routing) = update.routing {
            self.routing = routing;
            self.select_handlers();
        }

        if update.reset {
            tracing::debug!("resetting channel pair");
            self.pair.reset(&self.pool);
        }

        if let Some(sample_rate) = update.sample_rate {
            self.change_sample_rate(sample_rate);
        }

        if let Some(value) = update.buffer_size {
            let multiplier = transform::buffer_size_multiplier(value);
            if self.resize(multiplier).is_ok() {
                self.shared.buffer_size.set(value);
            }
        }

        for channel in Channel::ALL {
            let values = &update.params[channel.index()];
            for (id, value) in ParamId::ALL.iter().zip(values) {
                if let Some(v) = *value {
                    self.pair.apply(&self.pool, channel, *id, v);
                    self.shared.params[channel.index()][id.index()].set(v);
                }
            }
        }
    }

    fn change_sample_rate(&mut self, sample_rate: f32) {
        let old = self.pair.rate();
        self.pair.set_rate(&self.pool, RateConfig::new(sample_rate));

        match self.resize(self.buffer_size_multiplier) {
            Ok(()) => {
                self.shared.sample_rate.set(sample_rate);
                tracing::info!(sample_rate, "sample rate changed");
            }
            Err(err) => {
                // Buffers were sized back for the old rate.
                self.pair.set_rate(&self.pool, old);
                tracing::warn!(%err, sample_rate, "sample rate change rejected");
            }
        }
    }

    /// Resizes every buffer for `multiplier` at the current rate. On failure
    /// the previous sizes are restored; if that fails too the engine stops
    /// being operational until a later resize succeeds.
    fn resize(&mut self, multiplier: u32) -> Result<()> {
        let size = buffer_size(multiplier, &self.pair.rate());
        let (old_analyzer, old_synth) = self.pair.buffer_sizes();

        let result = self.pair.set_buffer_sizes(&self.pool, size, size);
        match result {
            Ok(()) => {
                tracing::debug!(multiplier, size, "buffers resized");
                self.buffer_size_multiplier = multiplier;
                self.shared.buffer_size_multiplier.set(multiplier);
            }
            Err(ref err) => {
                tracing::warn!(%err, multiplier, "buffer resize failed, restoring previous sizes");
                if let Err(err) = self
                    .pair
                    .set_buffer_sizes(&self.pool, old_analyzer, old_synth)
                {
                    tracing::warn!(%err, "restoring previous buffer sizes failed");
                }
            }
        }

        self.set_operational(self.pair.is_allocated());
        result.map_err(Into::into)
    }

    fn set_operational(&mut self, operational: bool) {
        if operational == self.operational {
            return;
        }
        if operational {
            tracing::info!("engine operational");
        } else {
            tracing::error!("sample buffers lost, engine silenced");
        }
        self.operational = operational;
        self.shared.operational.set(operational);
        self.select_handlers();
    }

    fn select_handlers(&mut self) {
        for mode in ProcessMode::ALL {
            self.handlers[mode.index()] = handler::select(self.routing, mode, self.operational);
        }
    }

    fn publish_monitors(&self) {
        let monitor = &self.shared.monitor;
        for channel in Channel::ALL {
            let i = channel.index();
            let analyzer = self.pair.analyzer(channel);
            let synth = self.pair.synthesizer(channel);
            monitor.pre_amplitude[i].set(analyzer.amplitude());
            monitor.post_amplitude[i].set(synth.amplitude());
            monitor.pre_frequency[i].set(analyzer.frequency());
            monitor.post_frequency[i].set(synth.frequency());
        }
    }
}

impl Drop for WaveEngine {
    fn drop(&mut self) {
        self.pair.release_buffers(&self.pool);
    }
}

impl std::fmt::Debug for WaveEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaveEngine")
            .field("pair", &self.pair)
            .field("routing", &self.routing)
            .field("buffer_size_multiplier", &self.buffer_size_multiplier)
            .field("operational", &self.operational)
            .finish()
    }
}
