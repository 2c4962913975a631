//! Single-cycle wavetable lookup.
//!
//! A table holds one cycle plus one trailing sample that equals the first
//! sample of the following cycle, so interpolation never has to wrap. Phase
//! positions run over [-1, 1]; positions outside that range wrap around.

static SILENT: [f32; 2] = [0.0, 0.0];

/// Read-only view over a captured cycle.
#[derive(Debug, Clone, Copy)]
pub struct Wavetable<'a> {
    samples: &'a [f32],
    size: usize,
    coefficient: f32,
    interpolation: bool,
}

impl<'a> Wavetable<'a> {
    /// `samples` holds the cycle plus its wraparound sample.
    pub fn new(samples: &'a [f32], interpolation: bool) -> Self {
        debug_assert!(samples.len() >= 2, "wavetable needs at least two samples");
        if samples.len() < 2 {
            return Self::silent();
        }
        let size = samples.len() - 1;
        Self {
            samples,
            size,
            coefficient: 0.5 * size as f32,
            interpolation,
        }
    }

    /// One cycle of silence.
    pub fn silent() -> Self {
        Self {
            samples: &SILENT,
            size: 1,
            coefficient: 0.5,
            interpolation: false,
        }
    }

    /// Cycle length, excluding the wraparound sample.
    #[inline]
    pub fn cycle_len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn interpolation(&self) -> bool {
        self.interpolation
    }

    #[inline]
    pub fn samples(&self) -> &'a [f32] {
        self.samples
    }

    /// Value at phase position `x`.
    #[inline]
    pub fn value(&self, x: f32) -> f32 {
        // The +3 offset keeps the index positive for x >= -3.
        let index = self.coefficient * (x + 3.0);
        let whole = index.floor();
        let weight = index - whole;
        let i = (whole as usize) % self.size;
        let s = self.samples[i];
        let next = self.samples[i + usize::from(self.interpolation)];
        s + weight * (next - s)
    }
}
