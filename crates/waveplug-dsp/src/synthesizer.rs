//! Cycle-by-cycle resynthesis into a circular output buffer.
//!
//! Whenever the read cursor reaches `last`, the synthesizer asks its source
//! for an amplitude, a frequency and one cycle of waveform and appends that
//! cycle to the ring. With a smoothing window, every cycle boundary is kept
//! back until `window` samples follow it, then the seam is blended with a
//! fade curve before the reader gets there.

use crate::analyzer::Analyzer;
use crate::give_back;
use waveplug_core::{clamp01, fade, BufferPool, Error, PoolBuffer, RateConfig, Result};

/// Inputs of a [`Synthesizer`], sampled once per generated cycle (amplitude,
/// frequency) or once per fetched sample (waveform).
pub trait SynthSource {
    /// Amplitude control, before offset and gain.
    fn amplitude(&mut self) -> f32;

    /// Frequency control in unsigned units, before offset and gain.
    fn frequency(&mut self) -> f32;

    /// Announces how many waveform samples the next cycle will fetch.
    fn set_cycle_size(&mut self, samples: f32);

    /// Waveform value at phase `x` in [-1, 1].
    fn wave(&mut self, x: f32) -> f32;
}

/// Plays an analyzer's own estimates back without modulation.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerSource<'a> {
    analyzer: &'a Analyzer,
}

impl<'a> AnalyzerSource<'a> {
    pub fn new(analyzer: &'a Analyzer) -> Self {
        Self { analyzer }
    }
}

impl SynthSource for AnalyzerSource<'_> {
    fn amplitude(&mut self) -> f32 {
        self.analyzer.amplitude()
    }

    fn frequency(&mut self) -> f32 {
        self.analyzer.frequency()
    }

    fn set_cycle_size(&mut self, _samples: f32) {}

    fn wave(&mut self, x: f32) -> f32 {
        self.analyzer.wavetable().value(x)
    }
}

/// Blends the seam after `pos` in a circular buffer.
///
/// The second differences around the seam are spread over `fade.len()`
/// samples on either side. A seam with matching slopes is left untouched.
pub fn smooth_boundary(ring: &mut [f32], pos: usize, fade: &[f32]) {
    let size = ring.len() as isize;
    if size < 4 {
        return;
    }
    let at = move |offset: isize| (pos as isize + offset).rem_euclid(size) as usize;

    let (s0, s1, s2, s3) = (ring[at(-1)], ring[at(0)], ring[at(1)], ring[at(2)]);
    let left = s1 - s0;
    let edge = s2 - s1;
    let right = s3 - s2;
    let d0 = 0.5 * (edge - 0.5 * (right + left));
    let d1 = -0.5 * (right - left);

    let mut m_left = d0;
    let mut m_right = -d0;
    for (i, &f) in fade.iter().enumerate() {
        let i = i as isize;
        ring[at(-i)] += f * m_left;
        ring[at(1 + i)] += f * m_right;
        m_left += d1;
        m_right += d1;
    }
}

/// Renders cycles from a [`SynthSource`] and serves them one sample at a time.
pub struct Synthesizer {
    rate: RateConfig,

    ring: Option<PoolBuffer<f32>>,
    size: usize,
    // Read cursor, refill point and write cursor.
    start: usize,
    last: usize,
    end: usize,

    boundaries: Option<PoolBuffer<usize>>,
    first_boundary: usize,
    boundary_count: usize,

    fade: Option<PoolBuffer<f32>>,
    smoothing_window: usize,
    window_size: usize,

    amp_offset: f32,
    amp_gain: f32,
    freq_offset: f32,
    freq_gain: f32,
    oversampling: usize,

    amplitude: f32,
    frequency: f32,
    carry: f32,
}

impl Synthesizer {
    /// Synthesizer without buffers. Call [`Synthesizer::set_buffer_size`] before use.
    pub fn new(rate: RateConfig) -> Self {
        Self {
            rate,
            ring: None,
            size: 0,
            start: 0,
            last: 0,
            end: 1,
            boundaries: None,
            first_boundary: 0,
            boundary_count: 0,
            fade: None,
            smoothing_window: 0,
            window_size: 0,
            amp_offset: 0.0,
            amp_gain: 1.0,
            freq_offset: 0.0,
            freq_gain: 1.0,
            oversampling: 1,
            amplitude: 0.0,
            frequency: 0.0,
            carry: 0.0,
        }
    }

    /// Reallocates the output ring and its boundary queue.
    ///
    /// On failure the synthesizer holds no ring and reports a size of 0.
    pub fn set_buffer_size(&mut self, pool: &BufferPool, size: usize) -> Result<()> {
        if size == self.size {
            return Ok(());
        }
        self.release_ring(pool);

        if size == 0 {
            return Ok(());
        }
        if size < 2 {
            return Err(Error::InvalidConfig(format!(
                "synthesizer ring must be 0 or at least 2 samples, got {size}"
            )));
        }

        let ring = pool
            .acquire::<f32>(size)
            .ok_or_else(|| Error::allocation::<f32>(size))?;
        let boundary_slots = size / 2 + 1;
        let boundaries = match pool.acquire::<usize>(boundary_slots) {
            Some(buffer) => buffer,
            None => {
                give_back(pool, ring);
                return Err(Error::allocation::<usize>(boundary_slots));
            }
        };

        tracing::debug!(size, "synthesizer ring allocated");
        self.ring = Some(ring);
        self.boundaries = Some(boundaries);
        self.size = size;
        self.reset(pool);
        Ok(())
    }

    /// Hands every buffer back to `pool`.
    pub fn release_buffers(&mut self, pool: &BufferPool) {
        self.release_ring(pool);
        if let Some(fade) = self.fade.take() {
            give_back(pool, fade);
        }
    }

    fn release_ring(&mut self, pool: &BufferPool) {
        if let Some(ring) = self.ring.take() {
            give_back(pool, ring);
        }
        if let Some(boundaries) = self.boundaries.take() {
            give_back(pool, boundaries);
        }
        self.size = 0;
        self.boundary_count = 0;
    }

    pub fn is_allocated(&self) -> bool {
        self.ring.is_some()
    }

    pub fn buffer_size(&self) -> usize {
        self.size
    }

    /// Empties the ring and rebuilds the fade curve for the current window.
    ///
    /// If the fade curve cannot be allocated, smoothing is switched off.
    pub fn reset(&mut self, pool: &BufferPool) {
        let Some(ring) = self.ring.as_mut() else {
            return;
        };
        self.start = 0;
        self.last = 0;
        self.end = 1;
        ring[0] = 0.0;
        self.first_boundary = 0;
        self.boundary_count = 0;
        self.amplitude = 0.0;
        self.frequency = 0.0;
        self.carry = 0.0;

        if let Some(old) = self.fade.take() {
            give_back(pool, old);
        }
        self.window_size = self.rate.scale_samples(self.smoothing_window);
        if self.window_size == 0 {
            return;
        }
        // The seam blend reads two samples past the boundary.
        self.window_size = self.window_size.min(self.size / 2).max(2);

        let Some(mut curve) = pool.acquire::<f32>(self.window_size) else {
            tracing::warn!(
                window = self.window_size,
                "fade curve allocation failed, smoothing disabled"
            );
            self.smoothing_window = 0;
            self.window_size = 0;
            return;
        };
        let step = 2.0 / self.window_size as f32;
        let mut x = -1.0 - 0.5 * step;
        for f in curve.iter_mut() {
            x += step;
            *f = 0.5 * (1.0 - fade(x));
        }
        self.fade = Some(curve);
    }

    /// Installs a new rate snapshot and resets.
    pub fn set_rate(&mut self, pool: &BufferPool, rate: RateConfig) {
        self.rate = rate;
        self.reset(pool);
    }

    pub fn rate(&self) -> RateConfig {
        self.rate
    }

    pub fn amp_offset(&self) -> f32 {
        self.amp_offset
    }

    pub fn set_amp_offset(&mut self, offset: f32) {
        self.amp_offset = offset;
    }

    pub fn amp_gain(&self) -> f32 {
        self.amp_gain
    }

    pub fn set_amp_gain(&mut self, gain: f32) {
        self.amp_gain = gain;
    }

    pub fn freq_offset(&self) -> f32 {
        self.freq_offset
    }

    pub fn set_freq_offset(&mut self, offset: f32) {
        self.freq_offset = offset;
    }

    pub fn freq_gain(&self) -> f32 {
        self.freq_gain
    }

    pub fn set_freq_gain(&mut self, gain: f32) {
        self.freq_gain = gain;
    }

    pub fn oversampling(&self) -> usize {
        self.oversampling
    }

    /// Waveform reads averaged into each output sample. At least 1.
    pub fn set_oversampling(&mut self, multiplier: usize) {
        self.oversampling = multiplier.max(1);
    }

    /// Smoothing window at 44.1 kHz, in samples.
    pub fn smoothing_window(&self) -> usize {
        self.smoothing_window
    }

    /// Window actually used at the current rate.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Changes the smoothing window and resets.
    pub fn set_smoothing_window(&mut self, pool: &BufferPool, samples: usize) {
        self.smoothing_window = samples;
        self.reset(pool);
    }

    /// Amplitude used for the latest cycle, after offset and gain.
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Frequency used for the latest cycle, in unsigned units.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Sample at the read cursor.
    #[inline]
    pub fn current(&self) -> f32 {
        match &self.ring {
            Some(ring) => ring[self.start],
            None => 0.0,
        }
    }

    /// Advances the read cursor, rendering more cycles first if needed.
    #[inline]
    pub fn tick<S: SynthSource + ?Sized>(&mut self, source: &mut S) {
        if self.ring.is_none() {
            return;
        }
        if self.start == self.last {
            self.fill_buffer(source);
        }
        self.start = (self.start + 1) % self.size;
    }

    fn fill_buffer<S: SynthSource + ?Sized>(&mut self, source: &mut S) {
        self.amplitude = clamp01(self.amp_gain * source.amplitude() + self.amp_offset);
        self.frequency = clamp01(self.freq_gain * source.frequency() + self.freq_offset);

        let size = self.size;
        if self.boundary_count == 0 {
            self.load_cycle(source);
        } else {
            while let Some(pos) = self.oldest_boundary() {
                let mut total = (self.end + size - 1 - pos) % size;
                while total < self.window_size && self.end != self.start {
                    let loaded = self.load_cycle(source);
                    if loaded == 0 {
                        break;
                    }
                    total += loaded;
                }
                if total >= self.window_size {
                    self.apply_smoothing(pos);
                }
                self.pop_boundary();

                // A boundary whose window starts behind the reader cannot gate
                // the next refill; blend it now.
                match self.oldest_boundary() {
                    Some(next) if !self.is_ahead(self.gate_of(next)) => continue,
                    _ => break,
                }
            }
        }

        self.last = match self.oldest_boundary() {
            Some(pos) => self.gate_of(pos),
            None => (self.end + size - 1) % size,
        };
        if !self.is_ahead(self.last) {
            self.load_cycle(source);
            self.last = (self.end + size - 1) % size;
        }
    }

    /// Renders one cycle at the write cursor and returns its length.
    fn load_cycle<S: SynthSource + ?Sized>(&mut self, source: &mut S) -> usize {
        let Some(ring) = self.ring.as_mut() else {
            return 0;
        };
        let size = self.size;

        let n = self.rate.sample_rate() / self.rate.unsigned_to_hz(self.frequency) + self.carry;
        let whole = n.floor();
        self.carry = n - whole;

        let free = (self.start + size - self.end) % size;
        if free == 0 {
            return 0;
        }
        let count = (whole as usize).clamp(1, free);
        let fetched = (count * self.oversampling) as f32;
        source.set_cycle_size(fetched);

        let step = 2.0 / fetched;
        let gain = self.amplitude / self.oversampling as f32;
        let mut x = -1.0;
        for _ in 0..count {
            let mut s = 0.0;
            for _ in 0..self.oversampling {
                s += source.wave(x);
                x += step;
            }
            ring[self.end] = gain * s;
            self.end = (self.end + 1) % size;
        }

        if self.window_size > 0 {
            self.push_boundary((self.end + size - 1) % size);
        }
        count
    }

    fn apply_smoothing(&mut self, pos: usize) {
        if let (Some(ring), Some(curve)) = (self.ring.as_mut(), self.fade.as_ref()) {
            smooth_boundary(ring, pos, curve);
        }
    }

    /// Refill point for a pending boundary.
    fn gate_of(&self, pos: usize) -> usize {
        (pos + self.size - self.window_size % self.size) % self.size
    }

    /// Whether `index` lies after the read cursor and before the write cursor.
    fn is_ahead(&self, index: usize) -> bool {
        let size = self.size;
        let distance = (index + size - self.start) % size;
        let readable = (self.end + size - 1 - self.start) % size;
        distance >= 1 && distance <= readable
    }

    fn oldest_boundary(&self) -> Option<usize> {
        if self.boundary_count == 0 {
            return None;
        }
        self.boundaries.as_ref().map(|b| b[self.first_boundary])
    }

    fn pop_boundary(&mut self) {
        if let Some(boundaries) = &self.boundaries {
            if self.boundary_count > 0 {
                self.first_boundary = (self.first_boundary + 1) % boundaries.len();
                self.boundary_count -= 1;
            }
        }
    }

    fn push_boundary(&mut self, pos: usize) {
        if let Some(boundaries) = self.boundaries.as_mut() {
            let slots = boundaries.len();
            if self.boundary_count < slots {
                boundaries[(self.first_boundary + self.boundary_count) % slots] = pos;
                self.boundary_count += 1;
            }
        }
    }
}

impl std::fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synthesizer")
            .field("size", &self.size)
            .field("start", &self.start)
            .field("last", &self.last)
            .field("end", &self.end)
            .field("window_size", &self.window_size)
            .field("oversampling", &self.oversampling)
            .finish()
    }
}
