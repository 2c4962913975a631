//! Numeric helpers shared by the analysis and synthesis paths.

/// Lower bound for envelope and waveform magnitudes. Keeps the per-sample
/// arithmetic out of the denormal range and doubles as a division guard.
pub const DENORMAL_FLOOR: f32 = 1.0e-8;

#[inline]
pub fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Odd sigmoid on [-1, 1] with `fade(-1) = -1`, `fade(0) = 0`, `fade(1) = 1`
/// and zero slope at both ends.
#[inline]
pub fn fade(x: f32) -> f32 {
    let x2 = x * x;
    x / (x2 * x2 - x2 + 1.0).sqrt()
}

/// Sign pattern of two consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignPair {
    PosPos,
    PosNeg,
    NegPos,
    NegNeg,
}

impl SignPair {
    /// Zero counts as positive.
    #[inline]
    pub fn of(a: f32, b: f32) -> Self {
        match (a < 0.0, b < 0.0) {
            (false, false) => SignPair::PosPos,
            (false, true) => SignPair::PosNeg,
            (true, false) => SignPair::NegPos,
            (true, true) => SignPair::NegNeg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_fade_endpoints() {
        assert_abs_diff_eq!(fade(-1.0), -1.0);
        assert_abs_diff_eq!(fade(0.0), 0.0);
        assert_abs_diff_eq!(fade(1.0), 1.0);
        assert!(fade(0.5) > 0.5);
    }

    #[test]
    fn test_sign_pair() {
        assert_eq!(SignPair::of(0.3, -0.1), SignPair::PosNeg);
        assert_eq!(SignPair::of(-0.3, 0.0), SignPair::NegPos);
        assert_eq!(SignPair::of(0.0, 0.0), SignPair::PosPos);
        assert_eq!(SignPair::of(-1.0, -1.0), SignPair::NegNeg);
    }
}
