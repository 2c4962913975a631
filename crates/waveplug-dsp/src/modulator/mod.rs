//! Modulators combine two signals of the same kind into one.
//!
//! There are three families:
//!
//! - [`UnsignedModulator`]: non-negative scalars such as amplitude and frequency
//! - [`SignedModulator`]: audio-rate signals in [-1, 1]
//! - [`FunctionModulator`]: waveforms, evaluated at a phase position
//!
//! Each modulator reads its two inputs through taps resolved by a
//! [`waveplug_core::SignalBus`]. Selecting an algorithm resolves it to a plain
//! function pointer, so the per-sample path never matches on the tag.

use waveplug_core::{RateConfig, STD_SAMPLE_RATE};

mod function;
mod signed;
mod unsigned;

pub use function::{FunctionModulation, FunctionModulator};
pub use signed::{SignedModulation, SignedModulator};
pub use unsigned::{UnsignedModulation, UnsignedModulator};

/// Triangle LFO driven by the mix setting. Used by the "Pong" algorithms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lfo {
    saw: f32,
    tri: f32,
    increment: f32,
    divisor: f32,
    rate_dependent: bool,
}

impl Lfo {
    /// `divisor` scales the mix setting down to a per-call phase increment.
    /// A rate-dependent LFO additionally compensates for the sample rate.
    pub fn new(divisor: f32, rate_dependent: bool) -> Self {
        Self {
            saw: 0.0,
            tri: 0.0,
            increment: 0.0,
            divisor,
            rate_dependent,
        }
    }

    pub fn set_speed(&mut self, mix: f32, rate: &RateConfig) {
        self.increment = if self.rate_dependent {
            mix * STD_SAMPLE_RATE / (self.divisor * rate.sample_rate())
        } else {
            mix / self.divisor
        };
    }

    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.saw = (self.saw + self.increment) % 1.0;
        self.tri = 2.0 * if self.saw > 0.5 { 1.0 - self.saw } else { self.saw };
        self.tri
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.tri
    }

    pub fn increment(&self) -> f32 {
        self.increment
    }

    pub fn reset(&mut self) {
        self.saw = 0.0;
        self.tri = 0.0;
    }
}

/// Mix setting and the coefficients every algorithm derives from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mix {
    /// Mix amount in [0, 1].
    pub amount: f32,
    /// `1 - amount`.
    pub inverse: f32,
    /// `2^(4 * amount) - 1`, the drive of the "Dist" algorithms.
    pub drive: f32,
    pub lfo: Lfo,
}

impl Mix {
    /// Zero mix. The drive starts at 1 until the first [`Mix::set`].
    pub fn new(lfo: Lfo) -> Self {
        Self {
            amount: 0.0,
            inverse: 1.0,
            drive: 1.0,
            lfo,
        }
    }

    pub fn set(&mut self, amount: f32, rate: &RateConfig) {
        self.amount = amount;
        self.inverse = 1.0 - amount;
        self.drive = (4.0 * amount).exp2() - 1.0;
        self.lfo.set_speed(amount, rate);
    }
}

/// Soft clip used by the "Dist" algorithms.
#[inline]
pub(crate) fn soft_clip(x: f32) -> f32 {
    x / (x * x + 1.0).sqrt()
}
