//! Control-thread side of the engine.
//!
//! The control thread never touches the processing state. It stages updates
//! in [`PendingUpdates`] behind a mutex that the audio thread only ever
//! `try_lock`s, and reads monitoring values that the audio thread publishes
//! through atomics after each block.

use crate::config::{validate_io, validate_sample_rate};
use crate::params::{transform, HostParam, MonoParam, ParamId};
use crate::Result;
use waveplug_core::compat::{Arc, Mutex};
use waveplug_core::{clamp01, AtomicCount, AtomicFlag, AtomicFloat, Channel, Error};

/// Channel counts and bypass state, resolved into a process handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routing {
    pub inputs: usize,
    pub outputs: usize,
    pub bypass: bool,
}

/// Updates staged by the control thread since the last block.
#[derive(Debug, Clone)]
pub(crate) struct PendingUpdates {
    pub reset: bool,
    pub routing: Option<Routing>,
    pub sample_rate: Option<f32>,
    pub buffer_size: Option<f32>,
    pub params: [[Option<f32>; ParamId::COUNT]; 2],
}

impl Default for PendingUpdates {
    fn default() -> Self {
        Self {
            reset: false,
            routing: None,
            sample_rate: None,
            buffer_size: None,
            params: [[None; ParamId::COUNT]; 2],
        }
    }
}

impl PendingUpdates {
    pub fn take(&mut self) -> PendingUpdates {
        std::mem::take(self)
    }
}

/// Values the audio thread publishes after each block.
#[derive(Debug, Default)]
pub(crate) struct Monitor {
    pub pre_amplitude: [AtomicFloat; 2],
    pub post_amplitude: [AtomicFloat; 2],
    pub pre_frequency: [AtomicFloat; 2],
    pub post_frequency: [AtomicFloat; 2],
}

/// State shared between a [`crate::WaveEngine`] and its control handles.
#[derive(Debug)]
pub(crate) struct Shared {
    pub pending: Mutex<PendingUpdates>,
    /// Routing as last requested, so bypass and IO can change independently.
    pub requested_routing: Mutex<Routing>,
    pub monitor: Monitor,
    /// Parameter values the engine has applied.
    pub params: [[AtomicFloat; ParamId::COUNT]; 2],
    pub buffer_size: AtomicFloat,
    pub buffer_size_multiplier: AtomicCount,
    pub sample_rate: AtomicFloat,
    pub operational: AtomicFlag,
}

impl Shared {
    pub fn new(routing: Routing, sample_rate: f32) -> Self {
        Self {
            pending: Mutex::new(PendingUpdates::default()),
            requested_routing: Mutex::new(routing),
            monitor: Monitor::default(),
            params: std::array::from_fn(|_| {
                std::array::from_fn(|i| AtomicFloat::new(ParamId::ALL[i].default_value()))
            }),
            buffer_size: AtomicFloat::new(MonoParam::BufferSize.default_value()),
            buffer_size_multiplier: AtomicCount::new(0),
            sample_rate: AtomicFloat::new(sample_rate),
            operational: AtomicFlag::new(true),
        }
    }
}

/// Thread-safe handle for controlling a [`crate::WaveEngine`] from outside
/// the audio thread.
///
/// Setters stage their update; the engine picks it up at the start of its
/// next block. Getters report what the engine has applied and measured so
/// far, so a value set here reads back only after a block has run.
///
/// ```ignore
/// let (mut engine, control) = WaveEngine::builder().sample_rate(48000.0).build()?;
///
/// control.set_parameter(Channel::First, ParamId::Oversampling, 0.2);
/// engine.process(&[&input], &mut [&mut output], ProcessMode::Replace);
///
/// let hz = control.frequency_hz(Channel::First, false);
/// ```
#[derive(Debug, Clone)]
pub struct ControlHandle {
    shared: Arc<Shared>,
}

impl ControlHandle {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Stages a normalized value for one channel's parameter. Values are
    /// clamped to [0, 1].
    pub fn set_parameter(&self, channel: Channel, id: ParamId, value: f32) {
        self.shared.pending.lock().params[channel.index()][id.index()] = Some(clamp01(value));
    }

    /// Stages a normalized buffer-size value, mapped to a multiplier of
    /// `2^⌊7v + 0.5⌋`.
    pub fn set_buffer_size(&self, value: f32) {
        self.shared.pending.lock().buffer_size = Some(clamp01(value));
    }

    /// Stages the buffer size as a multiplier. Rounds down to a power of two.
    pub fn set_buffer_size_multiplier(&self, multiplier: u32) {
        self.set_buffer_size(transform::buffer_size_value(multiplier));
    }

    /// Stages a value by its flat host index.
    pub fn set_host_parameter(&self, index: usize, value: f32) -> Result<()> {
        match HostParam::from_index(index)? {
            HostParam::Mono(MonoParam::BufferSize) => self.set_buffer_size(value),
            HostParam::Channel(channel, id) => self.set_parameter(channel, id, value),
        }
        Ok(())
    }

    pub fn set_sample_rate(&self, sample_rate: f32) -> Result<()> {
        validate_sample_rate(sample_rate)?;
        self.shared.pending.lock().sample_rate = Some(sample_rate);
        Ok(())
    }

    pub fn set_bypass(&self, bypass: bool) {
        let mut routing = self.shared.requested_routing.lock();
        routing.bypass = bypass;
        self.shared.pending.lock().routing = Some(*routing);
    }

    pub fn set_io(&self, inputs: usize, outputs: usize) -> Result<()> {
        validate_io(inputs, outputs)?;
        let mut routing = self.shared.requested_routing.lock();
        routing.inputs = inputs;
        routing.outputs = outputs;
        self.shared.pending.lock().routing = Some(*routing);
        Ok(())
    }

    /// Clears analyzer and synthesizer state on the next block.
    pub fn reset(&self) {
        self.shared.pending.lock().reset = true;
    }

    /// Applied normalized value of one channel's parameter.
    pub fn parameter(&self, channel: Channel, id: ParamId) -> f32 {
        self.shared.params[channel.index()][id.index()].get()
    }

    /// Applied normalized buffer-size value.
    pub fn buffer_size(&self) -> f32 {
        self.shared.buffer_size.get()
    }

    /// Applied value by flat host index.
    pub fn host_parameter(&self, index: usize) -> Result<f32> {
        Ok(match HostParam::from_index(index)? {
            HostParam::Mono(MonoParam::BufferSize) => self.buffer_size(),
            HostParam::Channel(channel, id) => self.parameter(channel, id),
        })
    }

    /// Analyzer envelope (`post == false`) or the amplitude the synthesizer
    /// used for its latest cycle (`post == true`).
    pub fn amplitude(&self, channel: Channel, post: bool) -> f32 {
        let monitor = &self.shared.monitor;
        let values = if post {
            &monitor.post_amplitude
        } else {
            &monitor.pre_amplitude
        };
        values[channel.index()].get()
    }

    /// Frequency before or after modulation, in unsigned units.
    pub fn frequency(&self, channel: Channel, post: bool) -> f32 {
        let monitor = &self.shared.monitor;
        let values = if post {
            &monitor.post_frequency
        } else {
            &monitor.pre_frequency
        };
        values[channel.index()].get()
    }

    /// [`ControlHandle::frequency`] in hertz at the applied sample rate.
    pub fn frequency_hz(&self, channel: Channel, post: bool) -> f32 {
        let rate = waveplug_core::RateConfig::new(self.sample_rate());
        rate.unsigned_to_hz(self.frequency(channel, post))
    }

    pub fn buffer_size_multiplier(&self) -> u32 {
        self.shared.buffer_size_multiplier.get()
    }

    pub fn sample_rate(&self) -> f32 {
        self.shared.sample_rate.get()
    }

    pub fn is_operational(&self) -> bool {
        self.shared.operational.get()
    }

    /// `Err(NotOperational)` once buffers were lost and could not be restored.
    pub fn ensure_operational(&self) -> Result<()> {
        if self.is_operational() {
            Ok(())
        } else {
            Err(Error::NotOperational.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> ControlHandle {
        let routing = Routing {
            inputs: 1,
            outputs: 1,
            bypass: false,
        };
        ControlHandle::new(Arc::new(Shared::new(routing, 44100.0)))
    }

    #[test]
    fn test_setters_stage_updates() {
        let control = handle();
        control.set_parameter(Channel::Second, ParamId::AmpGain, 1.5);
        control.set_buffer_size_multiplier(16);
        control.reset();

        let pending = control.shared.pending.lock().take();
        assert_eq!(pending.params[1][ParamId::AmpGain.index()], Some(1.0));
        assert_eq!(pending.params[0][ParamId::AmpGain.index()], None);
        assert_eq!(
            pending.buffer_size.map(transform::buffer_size_multiplier),
            Some(16)
        );
        assert!(pending.reset);

        let cleared = control.shared.pending.lock().take();
        assert!(!cleared.reset && cleared.buffer_size.is_none());
    }

    #[test]
    fn test_bypass_keeps_requested_io() {
        let control = handle();
        control.set_io(2, 2).unwrap();
        control.set_bypass(true);
        let routing = control.shared.pending.lock().take().routing;
        assert_eq!(
            routing,
            Some(Routing {
                inputs: 2,
                outputs: 2,
                bypass: true
            })
        );
    }

    #[test]
    fn test_invalid_requests_rejected() {
        let control = handle();
        assert!(control.set_io(3, 1).is_err());
        assert!(control.set_sample_rate(1000.0).is_err());
        assert_eq!(
            control.set_host_parameter(99, 0.5),
            Err(Error::UnknownParameter(99).into())
        );
        assert!(control.shared.pending.lock().take().routing.is_none());
    }

    #[test]
    fn test_getters_report_applied_values() {
        let control = handle();
        assert_eq!(
            control.parameter(Channel::First, ParamId::MaxFrequency),
            ParamId::MaxFrequency.default_value()
        );
        assert_eq!(control.host_parameter(0), Ok(2.0 / 7.0));
        assert!(control.ensure_operational().is_ok());

        control.shared.operational.set(false);
        assert_eq!(
            control.ensure_operational(),
            Err(Error::NotOperational.into())
        );
    }
}
