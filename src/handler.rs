//! Process handlers, one per channel layout, bypass state and output mode.
//!
//! The layout is resolved into a plain function pointer whenever routing
//! changes, so the per-sample loop carries no branches on configuration.

use crate::control::Routing;
use crate::pair::ChannelPair;
use waveplug_core::Channel;

/// How a block's output is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessMode {
    /// Overwrite the output buffers.
    #[default]
    Replace,
    /// Add to whatever the output buffers already hold.
    Accumulate,
}

impl ProcessMode {
    pub(crate) const ALL: [ProcessMode; 2] = [ProcessMode::Replace, ProcessMode::Accumulate];

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Renders `frames` samples. Callers guarantee enough buffers of at least
/// `frames` samples for the layout the handler was selected for.
pub(crate) type Handler = fn(&mut ChannelPair, &[&[f32]], &mut [&mut [f32]], usize);

/// Handler for `routing`, or the silent handler when the engine has lost
/// its buffers.
pub(crate) fn select(routing: Routing, mode: ProcessMode, operational: bool) -> Handler {
    match (operational, mode) {
        (false, ProcessMode::Replace) => select_silent::<false>(routing),
        (false, ProcessMode::Accumulate) => select_silent::<true>(routing),
        (true, ProcessMode::Replace) => select_layout::<false>(routing),
        (true, ProcessMode::Accumulate) => select_layout::<true>(routing),
    }
}

fn select_silent<const ACCUMULATE: bool>(routing: Routing) -> Handler {
    match routing.outputs {
        1 => silent::<1, ACCUMULATE>,
        2 => silent::<2, ACCUMULATE>,
        _ => silent::<0, ACCUMULATE>,
    }
}

fn select_layout<const ACCUMULATE: bool>(routing: Routing) -> Handler {
    match (routing.inputs, routing.outputs, routing.bypass) {
        (1, 1, false) => render::<1, 1, false, ACCUMULATE>,
        (1, 1, true) => render::<1, 1, true, ACCUMULATE>,
        (1, 2, false) => render::<1, 2, false, ACCUMULATE>,
        (1, 2, true) => render::<1, 2, true, ACCUMULATE>,
        (2, 1, false) => render::<2, 1, false, ACCUMULATE>,
        (2, 1, true) => render::<2, 1, true, ACCUMULATE>,
        (2, 2, false) => render::<2, 2, false, ACCUMULATE>,
        (2, 2, true) => render::<2, 2, true, ACCUMULATE>,
        _ => silent::<0, ACCUMULATE>,
    }
}

#[inline(always)]
fn write<const ACCUMULATE: bool>(out: &mut f32, value: f32) {
    if ACCUMULATE {
        *out += value;
    } else {
        *out = value;
    }
}

/// With one input both analyzers hear it. Bypass keeps analysis and
/// resynthesis running and passes the inputs through.
fn render<const INPUTS: usize, const OUTPUTS: usize, const BYPASS: bool, const ACCUMULATE: bool>(
    pair: &mut ChannelPair,
    inputs: &[&[f32]],
    outputs: &mut [&mut [f32]],
    frames: usize,
) {
    let in0 = inputs[0];
    let in1 = inputs[INPUTS - 1];

    for n in 0..frames {
        let (a, b) = (in0[n], in1[n]);
        pair.analyze(a, b);

        if BYPASS {
            write::<ACCUMULATE>(&mut outputs[0][n], a);
            if OUTPUTS == 2 {
                write::<ACCUMULATE>(&mut outputs[1][n], b);
            }
        } else {
            write::<ACCUMULATE>(&mut outputs[0][n], pair.output(Channel::First));
            if OUTPUTS == 2 {
                write::<ACCUMULATE>(&mut outputs[1][n], pair.output(Channel::Second));
            }
        }

        pair.tick();
    }
}

/// Leaves every component untouched. The first `OUTPUTS` buffers are zeroed
/// when replacing.
fn silent<const OUTPUTS: usize, const ACCUMULATE: bool>(
    _pair: &mut ChannelPair,
    _inputs: &[&[f32]],
    outputs: &mut [&mut [f32]],
    frames: usize,
) {
    if !ACCUMULATE {
        for out in outputs.iter_mut().take(OUTPUTS) {
            let n = frames.min(out.len());
            out[..n].fill(0.0);
        }
    }
}
