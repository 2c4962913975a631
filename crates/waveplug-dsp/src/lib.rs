//! Per-cycle analysis and resynthesis: the analyzer tracks amplitude, frequency
//! and the shape of the latest cycle of its input; the synthesizer plays
//! cycles back through modulators that mix the two channels of a pair.
//!
//! Nothing here allocates or logs on the per-sample path. Buffers come from a
//! [`waveplug_core::BufferPool`] while a component is being reconfigured.

pub use waveplug_core::{Error, Result};
use waveplug_core::{BufferPool, PoolBuffer};

mod analyzer;
pub use analyzer::{normalize_cycle, Analyzer, AnalyzerConfig};

pub mod modulator;
pub use modulator::{
    FunctionModulation, FunctionModulator, SignedModulation, SignedModulator,
    UnsignedModulation, UnsignedModulator,
};

mod synthesizer;
pub use synthesizer::{smooth_boundary, AnalyzerSource, SynthSource, Synthesizer};

/// Hands `buffer` back to `pool`. A buffer from some other pool is dropped,
/// which returns it to the pool that issued it.
pub(crate) fn give_back<T>(pool: &BufferPool, buffer: PoolBuffer<T>) {
    if let Err(buffer) = pool.release(buffer) {
        tracing::warn!(len = buffer.len(), "buffer released to a pool that did not issue it");
    }
}
