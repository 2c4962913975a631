//! Tolerance constants for audio testing.
//!
//! Resynthesis never reproduces its input sample for sample, so most
//! tolerances here are about levels and pitch rather than waveforms.

/// Floating point rounding errors (for passthrough, exact gain).
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Silence threshold (~-80dB).
/// Values below this are considered silent.
pub const SILENCE_THRESHOLD: f32 = 0.0001;

/// Frequency tracking tolerance, in hertz.
pub const PITCH_EPSILON_HZ: f32 = 1.5;

/// Peak level tolerance for resynthesized sines.
pub const LEVEL_EPSILON: f32 = 0.06;
