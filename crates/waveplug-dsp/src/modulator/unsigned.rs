//! Modulation of non-negative scalars: amplitude and frequency.

use super::{soft_clip, Lfo, Mix};
use waveplug_core::{RateConfig, ScalarTap, SignalBus, DENORMAL_FLOOR};

/// Algorithm of an [`UnsignedModulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsignedModulation {
    /// Crossfade from input 1 to input 2.
    #[default]
    Add,
    /// Push the lower input away from the higher one.
    MinDiff,
    /// Subtract the lower input from the higher one.
    MaxDiff,
    /// Move input 2 into the octave of input 1, then crossfade.
    Fine,
    /// Ring-modulate input 1 by input 2.
    Mult,
    /// Drive input 1 by input 2 into a soft clipper.
    Dist,
    /// Lift input 1 towards 1 by input 2.
    Top,
    /// Crossfade driven by a triangle LFO.
    Pong,
}

impl UnsignedModulation {
    pub const ALL: [UnsignedModulation; 8] = [
        UnsignedModulation::Add,
        UnsignedModulation::MinDiff,
        UnsignedModulation::MaxDiff,
        UnsignedModulation::Fine,
        UnsignedModulation::Mult,
        UnsignedModulation::Dist,
        UnsignedModulation::Top,
        UnsignedModulation::Pong,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            UnsignedModulation::Add => "Add",
            UnsignedModulation::MinDiff => "MinDiff",
            UnsignedModulation::MaxDiff => "MaxDiff",
            UnsignedModulation::Fine => "Fine",
            UnsignedModulation::Mult => "Mult",
            UnsignedModulation::Dist => "Dist",
            UnsignedModulation::Top => "Top",
            UnsignedModulation::Pong => "Pong",
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    fn compute_fn(self) -> ComputeFn {
        match self {
            UnsignedModulation::Add => add,
            UnsignedModulation::MinDiff => min_diff,
            UnsignedModulation::MaxDiff => max_diff,
            UnsignedModulation::Fine => fine,
            UnsignedModulation::Mult => mult,
            UnsignedModulation::Dist => dist,
            UnsignedModulation::Top => top,
            UnsignedModulation::Pong => pong,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct State {
    mix: Mix,
    fine_scale: f32,
    fine_base: f32,
    inv_log_fine_base: f32,
}

type ComputeFn = fn(&mut State, f32, f32) -> f32;

fn add(s: &mut State, v1: f32, v2: f32) -> f32 {
    v1 + s.mix.amount * (v2 - v1)
}

fn min_diff(s: &mut State, v1: f32, v2: f32) -> f32 {
    let (lo, hi) = if v1 < v2 { (v1, v2) } else { (v2, v1) };
    lo - s.mix.amount * (2.0 * lo - hi)
}

fn max_diff(s: &mut State, v1: f32, v2: f32) -> f32 {
    let (lo, hi) = if v1 > v2 { (v2, v1) } else { (v1, v2) };
    hi - s.mix.amount * lo
}

fn fine(s: &mut State, v1: f32, v2: f32) -> f32 {
    if v1 < DENORMAL_FLOOR || v2 < DENORMAL_FLOOR {
        return v1;
    }
    let octave = |v: f32| ((v / s.fine_scale).ln() * s.inv_log_fine_base).floor();
    let shift = octave(v1) - octave(v2);
    v1 + s.mix.amount * (v2 * s.fine_base.powf(shift) - v1)
}

fn mult(s: &mut State, v1: f32, v2: f32) -> f32 {
    v1 * (s.mix.inverse + s.mix.amount * v2)
}

fn dist(s: &mut State, v1: f32, v2: f32) -> f32 {
    soft_clip(v1 * (s.mix.drive * v2 + 1.0))
}

fn top(s: &mut State, v1: f32, v2: f32) -> f32 {
    v1 + s.mix.amount * v2 * (1.0 - v1).abs()
}

fn pong(s: &mut State, v1: f32, v2: f32) -> f32 {
    let tri = s.mix.lfo.advance();
    v1 + tri * (v2 - v1)
}

/// Combines two non-negative scalar taps.
#[derive(Debug, Clone)]
pub struct UnsignedModulator {
    input1: ScalarTap,
    input2: ScalarTap,
    modulation: UnsignedModulation,
    rate: RateConfig,
    state: State,
    compute: ComputeFn,
}

impl UnsignedModulator {
    pub const DEFAULT_FINE_SCALE: f32 = 0.5;
    pub const DEFAULT_FINE_BASE: f32 = 2.0;
    const LFO_DIVISOR: f32 = 12.0;

    pub fn new(input1: ScalarTap, input2: ScalarTap, rate: RateConfig) -> Self {
        let base = Self::DEFAULT_FINE_BASE;
        Self {
            input1,
            input2,
            modulation: UnsignedModulation::Add,
            rate,
            state: State {
                mix: Mix::new(Lfo::new(Self::LFO_DIVISOR, false)),
                fine_scale: Self::DEFAULT_FINE_SCALE,
                fine_base: base,
                inv_log_fine_base: 1.0 / base.ln(),
            },
            compute: add,
        }
    }

    /// Reference level and ratio of the octaves used by
    /// [`UnsignedModulation::Fine`].
    pub fn with_fine_tuning(mut self, scale: f32, base: f32) -> Self {
        self.state.fine_scale = scale;
        self.state.fine_base = base;
        self.state.inv_log_fine_base = 1.0 / base.ln();
        self
    }

    pub fn inputs(&self) -> (ScalarTap, ScalarTap) {
        (self.input1, self.input2)
    }

    pub fn modulation(&self) -> UnsignedModulation {
        self.modulation
    }

    pub fn set_modulation(&mut self, modulation: UnsignedModulation) {
        self.modulation = modulation;
        self.compute = modulation.compute_fn();
    }

    pub fn mix(&self) -> f32 {
        self.state.mix.amount
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.state.mix.set(mix, &self.rate);
    }

    pub fn set_rate(&mut self, rate: RateConfig) {
        self.rate = rate;
        let mix = self.state.mix.amount;
        self.state.mix.set(mix, &rate);
    }

    /// Combines two values directly, bypassing the taps.
    #[inline]
    pub fn combine(&mut self, v1: f32, v2: f32) -> f32 {
        (self.compute)(&mut self.state, v1, v2)
    }

    /// Current output.
    #[inline]
    pub fn value<B: SignalBus + ?Sized>(&mut self, bus: &B) -> f32 {
        let v1 = bus.scalar(self.input1);
        let v2 = bus.scalar(self.input2);
        self.combine(v1, v2)
    }
}
