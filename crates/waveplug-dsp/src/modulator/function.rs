//! Modulation of waveforms.
//!
//! A function modulator is evaluated at a phase position in [-1, 1] and reads
//! both input waveforms there, except for `Comp` (input 1 drives the phase of
//! input 2) and `Conv` (input 1 filtered by a kernel sampled from input 2).

use super::{soft_clip, Lfo, Mix};
use waveplug_core::{RateConfig, SignalBus, WaveTap, Wavetable};

/// Algorithm of a [`FunctionModulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FunctionModulation {
    #[default]
    Add,
    Diff,
    Mult,
    Dist,
    Top,
    /// Phase-distort input 2 by input 1.
    Comp,
    /// Convolve input 1 with a kernel taken from input 2.
    Conv,
    Pong,
}

impl FunctionModulation {
    pub const ALL: [FunctionModulation; 8] = [
        FunctionModulation::Add,
        FunctionModulation::Diff,
        FunctionModulation::Mult,
        FunctionModulation::Dist,
        FunctionModulation::Top,
        FunctionModulation::Comp,
        FunctionModulation::Conv,
        FunctionModulation::Pong,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FunctionModulation::Add => "Add",
            FunctionModulation::Diff => "Diff",
            FunctionModulation::Mult => "Mult",
            FunctionModulation::Dist => "Dist",
            FunctionModulation::Top => "Top",
            FunctionModulation::Comp => "Comp",
            FunctionModulation::Conv => "Conv",
            FunctionModulation::Pong => "Pong",
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    fn compute_fn(self) -> ComputeFn {
        match self {
            FunctionModulation::Add => add,
            FunctionModulation::Diff => diff,
            FunctionModulation::Mult => mult,
            FunctionModulation::Dist => dist,
            FunctionModulation::Top => top,
            FunctionModulation::Comp => comp,
            FunctionModulation::Conv => conv,
            FunctionModulation::Pong => pong,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct State {
    mix: Mix,
    kernel_len: usize,
    kernel_len_f: f32,
    kernel_step: f32,
    cycle_step: f32,
    half_kernel_width: f32,
}

impl State {
    fn set_kernel(&mut self, mix: f32) {
        self.kernel_len_f = 2.0 + (28.0 * mix).floor();
        self.kernel_len = self.kernel_len_f as usize;
        self.kernel_step = 2.0 / self.kernel_len_f;
    }
}

type ComputeFn = fn(&mut State, &Wavetable<'_>, &Wavetable<'_>, f32) -> f32;

fn identity(_: &mut State, w1: &Wavetable<'_>, _: &Wavetable<'_>, x: f32) -> f32 {
    w1.value(x)
}

fn add(s: &mut State, w1: &Wavetable<'_>, w2: &Wavetable<'_>, x: f32) -> f32 {
    let (v1, v2) = (w1.value(x), w2.value(x));
    v1 + s.mix.amount * (v2 - v1)
}

fn diff(s: &mut State, w1: &Wavetable<'_>, w2: &Wavetable<'_>, x: f32) -> f32 {
    let (v1, v2) = (w1.value(x), w2.value(x));
    v1 + s.mix.amount * (-v2 - v1)
}

fn mult(s: &mut State, w1: &Wavetable<'_>, w2: &Wavetable<'_>, x: f32) -> f32 {
    let (v1, v2) = (w1.value(x), w2.value(x));
    v1 * (s.mix.inverse + s.mix.amount * v2)
}

fn dist(s: &mut State, w1: &Wavetable<'_>, w2: &Wavetable<'_>, x: f32) -> f32 {
    let (v1, v2) = (w1.value(x), w2.value(x));
    soft_clip(v1 * (s.mix.drive * v2.abs() + 1.0))
}

fn top(s: &mut State, w1: &Wavetable<'_>, w2: &Wavetable<'_>, x: f32) -> f32 {
    let (v1, v2) = (w1.value(x), w2.value(x));
    v1 + s.mix.amount * v2.copysign(v1) * (1.0 - v1.abs())
}

fn comp(s: &mut State, w1: &Wavetable<'_>, w2: &Wavetable<'_>, x: f32) -> f32 {
    let v1 = w1.value(x);
    let v2 = w2.value(v1);
    v1 + s.mix.amount * (v2 - v1)
}

fn conv(s: &mut State, w1: &Wavetable<'_>, w2: &Wavetable<'_>, x: f32) -> f32 {
    let mut acc = 0.0;
    let mut tau = x + s.half_kernel_width;
    if tau > 1.0 {
        tau -= 2.0;
    }
    let mut kernel_tau = 0.5 * s.kernel_step - 1.0;

    for _ in 0..s.kernel_len {
        acc += w1.value(tau) * w2.value(kernel_tau);
        tau -= s.cycle_step;
        if tau < -1.0 {
            tau += 2.0;
        }
        kernel_tau += s.kernel_step;
    }

    // Bounded by the output of a kernel_len-point averager.
    acc / s.kernel_len_f
}

fn pong(s: &mut State, w1: &Wavetable<'_>, w2: &Wavetable<'_>, x: f32) -> f32 {
    let tri = s.mix.lfo.advance();
    let (v1, v2) = (w1.value(x), w2.value(x));
    v1 + tri * (v2 - v1)
}

/// Combines two waveform taps.
#[derive(Debug, Clone)]
pub struct FunctionModulator {
    input1: WaveTap,
    input2: WaveTap,
    modulation: FunctionModulation,
    rate: RateConfig,
    state: State,
    compute: ComputeFn,
    identity: bool,
}

impl FunctionModulator {
    const LFO_DIVISOR: f32 = 5000.0;

    pub fn new(input1: WaveTap, input2: WaveTap, rate: RateConfig) -> Self {
        Self {
            input1,
            input2,
            modulation: FunctionModulation::Add,
            rate,
            state: State {
                mix: Mix::new(Lfo::new(Self::LFO_DIVISOR, true)),
                kernel_len: 2,
                kernel_len_f: 2.0,
                kernel_step: 1.0,
                // Placeholders until the first set_cycle_size.
                cycle_step: -1.0,
                half_kernel_width: -1.0,
            },
            compute: identity,
            identity: true,
        }
    }

    pub fn inputs(&self) -> (WaveTap, WaveTap) {
        (self.input1, self.input2)
    }

    pub fn modulation(&self) -> FunctionModulation {
        self.modulation
    }

    pub fn set_modulation(&mut self, modulation: FunctionModulation) {
        self.modulation = modulation;
        self.resolve();
    }

    pub fn mix(&self) -> f32 {
        self.state.mix.amount
    }

    /// Also sets the kernel length used by [`FunctionModulation::Conv`].
    pub fn set_mix(&mut self, mix: f32) {
        self.state.mix.set(mix, &self.rate);
        self.state.set_kernel(mix);
        self.resolve();
    }

    pub fn set_rate(&mut self, rate: RateConfig) {
        self.rate = rate;
        let mix = self.state.mix.amount;
        self.state.mix.set(mix, &rate);
    }

    /// Number of samples the caller will read per cycle.
    pub fn set_cycle_size(&mut self, samples: f32) {
        self.state.cycle_step = 2.0 / samples;
        self.state.half_kernel_width =
            (0.5 * (self.state.kernel_len_f - 1.0) * self.state.cycle_step) % 2.0;
    }

    /// Kernel length used by [`FunctionModulation::Conv`].
    pub fn kernel_len(&self) -> usize {
        self.state.kernel_len
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    fn resolve(&mut self) {
        self.identity = self.modulation == FunctionModulation::Add && self.state.mix.amount == 0.0;
        self.compute = if self.identity {
            identity
        } else {
            self.modulation.compute_fn()
        };
    }

    /// Evaluates two waveforms directly, bypassing the taps.
    #[inline]
    pub fn combine(&mut self, w1: &Wavetable<'_>, w2: &Wavetable<'_>, x: f32) -> f32 {
        (self.compute)(&mut self.state, w1, w2, x)
    }

    /// Output at phase `x`.
    #[inline]
    pub fn value<B: SignalBus + ?Sized>(&mut self, bus: &B, x: f32) -> f32 {
        let w1 = bus.wave(self.input1);
        let w2 = bus.wave(self.input2);
        self.combine(&w1, &w2, x)
    }
}
