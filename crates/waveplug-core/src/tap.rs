//! Signal taps: read-only handles to live values owned elsewhere.
//!
//! Modulators never hold references to the analyzers or synthesizers they read.
//! They hold taps, and whoever owns the channel pair lends them a [`SignalBus`]
//! that resolves each tap to its current value.

use crate::wavetable::Wavetable;
use serde::{Deserialize, Serialize};

/// One of the two processing channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    First,
    Second,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::First, Channel::Second];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Channel::First => 0,
            Channel::Second => 1,
        }
    }

    #[inline]
    pub fn other(self) -> Channel {
        match self {
            Channel::First => Channel::Second,
            Channel::Second => Channel::First,
        }
    }

    pub fn from_index(index: usize) -> Option<Channel> {
        match index {
            0 => Some(Channel::First),
            1 => Some(Channel::Second),
            _ => None,
        }
    }
}

/// Handle to a scalar signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarTap {
    /// Analyzer amplitude estimate.
    Amplitude(Channel),
    /// Analyzer frequency estimate, in unsigned units.
    Frequency(Channel),
    /// Synthesizer output sample at the read cursor.
    Audio(Channel),
}

/// Handle to a waveform-shaped signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveTap {
    /// Analyzer playback cycle.
    Wave(Channel),
}

/// Resolves taps to their current values.
pub trait SignalBus {
    fn scalar(&self, tap: ScalarTap) -> f32;

    fn wave(&self, tap: WaveTap) -> Wavetable<'_>;
}
