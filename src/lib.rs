//! # WavePlug - per-cycle pitch analysis and wavetable resynthesis
//!
//! A two-channel audio effect that follows the pitch of its input one cycle
//! at a time, captures the shape of each cycle, and plays that shape back at
//! a tracked, modulated and possibly transposed frequency.
//!
//! ## Architecture
//!
//! WavePlug is an umbrella crate over:
//! - **waveplug-core** - Buffer pool, rate snapshot, wavetable lookup, signal taps
//! - **waveplug-dsp** - Analyzer, Synthesizer and the Unsigned/Signed/Function modulators
//!
//! This crate wires them into a [`ChannelPair`] whose channels modulate each
//! other, and drives the pair from a [`WaveEngine`] on the audio thread while a
//! [`ControlHandle`] stages parameter changes and reads monitoring values from
//! any other thread.
//!
//! ## Quick Start
//!
//! ```ignore
//! use waveplug::prelude::*;
//!
//! let (mut engine, control) = WaveEngine::builder()
//!     .sample_rate(48000.0)
//!     .build()?;
//!
//! // Transpose the first channel up an octave.
//! control.set_parameter(Channel::First, ParamId::FreqGain, 0.75);
//!
//! engine.process(&[&input], &mut [&mut output], ProcessMode::Replace);
//! println!("{:.1} Hz", control.frequency_hz(Channel::First, false));
//! ```

/// Re-export of waveplug-core for direct access
pub use waveplug_core as core;

/// Re-export of waveplug-dsp for direct access
pub use waveplug_dsp as dsp;

pub use waveplug_core::{BufferPool, Channel, RateConfig};
pub use waveplug_dsp::{FunctionModulation, SignedModulation, UnsignedModulation};

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::EngineConfig;

pub mod params;
pub use params::{HostParam, MonoParam, ParamId};

pub mod pair;
pub use pair::ChannelPair;

mod handler;
pub use handler::ProcessMode;

mod control;
pub use control::{ControlHandle, Routing};

mod engine;
pub use engine::WaveEngine;

mod builder;
pub use builder::WaveEngineBuilder;

/// Prelude module for convenient imports
///
/// ```ignore
/// use waveplug::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Channel, ControlHandle, EngineConfig, Error, ParamId, ProcessMode, Result, WaveEngine,
        WaveEngineBuilder,
    };
}
