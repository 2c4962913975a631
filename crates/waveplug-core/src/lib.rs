//! Core runtime pieces for the WavePlug resynthesis engine.
//!
//! # Primary API
//!
//! - [`BufferPool`] / [`PoolBuffer`]: reconfiguration-time memory with tracked ownership
//! - [`RateConfig`]: immutable sample-rate snapshot and unsigned-frequency conversion
//! - [`Wavetable`]: single-cycle lookup with optional linear interpolation
//! - [`SignalBus`], [`ScalarTap`], [`WaveTap`]: read-only handles between components
//! - [`AtomicFloat`], [`AtomicFlag`], [`AtomicCount`]: lock-free monitoring values

pub mod error;
pub use error::{Error, Result};

pub mod compat;

pub(crate) mod lockfree;
pub use lockfree::{AtomicCount, AtomicFlag, AtomicFloat};

pub mod buffer_pool;
pub use buffer_pool::{BufferPool, PoolBuffer};

pub mod math;
pub use math::{clamp01, fade, SignPair, DENORMAL_FLOOR};

pub mod rate;
pub use rate::{RateConfig, STD_SAMPLE_RATE};

pub mod tap;
pub use tap::{Channel, ScalarTap, SignalBus, WaveTap};

pub mod wavetable;
pub use wavetable::Wavetable;
