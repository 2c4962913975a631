//! Cycle-by-cycle analysis of a mono signal.
//!
//! The analyzer follows the input with an attack/decay envelope and uses that
//! envelope to place trigger thresholds. Two threshold crossings of opposite
//! polarity arm the end-of-cycle detector, which then closes the cycle at the
//! next zero crossing in the configured direction. Each completed cycle updates
//! the frequency estimate and, after normalization, becomes the playback
//! waveform.
//!
//! Captured cycles live in a two-slot arena: one slot is written while the
//! other is read. Completing a cycle flips the live index.

use crate::give_back;
use waveplug_core::{
    BufferPool, Error, PoolBuffer, RateConfig, Result, SignPair, Wavetable, DENORMAL_FLOOR,
};

/// Envelope reset value.
const RESET_AMPLITUDE: f32 = DENORMAL_FLOOR;

/// Frequency estimate after a reset, in hertz.
const RESET_FREQUENCY_HZ: f32 = 440.0;

/// Analyzer settings, in physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzerConfig {
    /// Per-sample envelope lag while the input rises, at 44.1 kHz. 0 follows instantly.
    pub attack_lag: f32,
    /// Per-sample envelope lag while the input falls, at 44.1 kHz.
    pub decay_lag: f32,
    /// Envelope level below which analysis pauses.
    pub amp_gate: f32,
    /// Sample magnitude below which analysis pauses.
    pub sample_gate: f32,
    /// Peak threshold, relative to the envelope.
    pub high_trigger: f32,
    /// Trough threshold, relative to the envelope.
    pub low_trigger: f32,
    /// Lowest detectable frequency in hertz.
    pub min_frequency: f32,
    /// Highest detectable frequency in hertz.
    pub max_frequency: f32,
    /// Per-cycle lag of the frequency estimate. 0 disables lag.
    pub frequency_lag: f32,
    /// Per-cycle lag of the waveform. 0 disables lag.
    pub wave_lag: f32,
    /// Close cycles on negative-to-positive crossings instead.
    pub inverted: bool,
    /// Interpolate playback lookups.
    pub interpolation: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            attack_lag: 0.95,
            decay_lag: 0.998,
            amp_gate: 1.0e-4,
            sample_gate: 0.05,
            high_trigger: 0.8,
            low_trigger: -0.8,
            min_frequency: 1.0,
            max_frequency: 22000.0,
            frequency_lag: 0.0,
            wave_lag: 0.0,
            inverted: false,
            interpolation: false,
        }
    }
}

/// Normalizes a captured cycle in place and returns the knee level.
///
/// Samples up to `min(amplitude, peak)` scale linearly onto `[0, knee]`; the
/// rest is compressed onto `[knee, 1]`, so the peak lands on exactly ±1.
pub fn normalize_cycle(cycle: &mut [f32], amplitude: f32, peak: f32) -> f32 {
    let max_normal = amplitude.min(peak) + DENORMAL_FLOOR;
    let over = peak - max_normal + 2.0 * DENORMAL_FLOOR;
    let knee = 1.0 - 0.125 * (8.0 * over + 1.0).log10();

    let normal_gain = knee / max_normal;
    let limit_gain = (1.0 - knee) / over;
    let limit_offset = knee - limit_gain * max_normal;

    for s in cycle.iter_mut() {
        if s.abs() > max_normal {
            *s = *s * limit_gain + limit_offset.copysign(*s);
        } else {
            *s *= normal_gain;
        }
    }
    knee
}

/// Tracks amplitude, frequency and waveform of one input channel.
pub struct Analyzer {
    rate: RateConfig,
    config: AnalyzerConfig,

    // Derived from config and rate.
    attack_weight: f32,
    decay_weight: f32,
    frequency_weight: f32,
    wave_weight: f32,
    min_cycle: usize,
    max_cycle: usize,
    end_of_cycle: SignPair,

    slots: Option<[PoolBuffer<f32>; 2]>,
    capacity: usize,
    live: usize,
    playback_len: usize,
    capture_len: usize,

    amplitude: f32,
    frequency: f32,
    peak: f32,
    armed: bool,
    expect_peak: bool,
    crossings: u32,
    cycles: u64,
}

impl Analyzer {
    /// Analyzer without buffers. Call [`Analyzer::set_buffer_size`] before use.
    pub fn new(rate: RateConfig, config: AnalyzerConfig) -> Self {
        let mut analyzer = Self {
            rate,
            config,
            attack_weight: 0.0,
            decay_weight: 0.0,
            frequency_weight: 1.0,
            wave_weight: 1.0,
            min_cycle: 2,
            max_cycle: 2,
            end_of_cycle: SignPair::PosNeg,
            slots: None,
            capacity: 0,
            live: 0,
            playback_len: 2,
            capture_len: 0,
            amplitude: RESET_AMPLITUDE,
            frequency: rate.hz_to_unsigned(RESET_FREQUENCY_HZ),
            peak: 0.0,
            armed: false,
            expect_peak: false,
            crossings: 0,
            cycles: 0,
        };
        analyzer.apply_config();
        analyzer
    }

    /// Reallocates both cycle slots with room for `capacity` samples.
    ///
    /// On failure the analyzer holds no buffers and reports a capacity of 0.
    pub fn set_buffer_size(&mut self, pool: &BufferPool, capacity: usize) -> Result<()> {
        if capacity == self.capacity {
            return Ok(());
        }
        self.release_buffers(pool);

        if capacity == 0 {
            return Ok(());
        }
        if capacity < 2 {
            return Err(Error::InvalidConfig(format!(
                "analyzer capacity must be 0 or at least 2, got {capacity}"
            )));
        }

        let first = pool
            .acquire::<f32>(capacity)
            .ok_or_else(|| Error::allocation::<f32>(capacity))?;
        let second = match pool.acquire::<f32>(capacity) {
            Some(buffer) => buffer,
            None => {
                give_back(pool, first);
                return Err(Error::allocation::<f32>(capacity));
            }
        };

        tracing::debug!(capacity, "analyzer buffers allocated");
        self.slots = Some([first, second]);
        self.capacity = capacity;
        self.update_cycle_bounds();
        self.reset();
        Ok(())
    }

    /// Hands both slots back to `pool`.
    pub fn release_buffers(&mut self, pool: &BufferPool) {
        if let Some([first, second]) = self.slots.take() {
            give_back(pool, first);
            give_back(pool, second);
        }
        self.capacity = 0;
        self.update_cycle_bounds();
    }

    pub fn is_allocated(&self) -> bool {
        self.slots.is_some()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Installs a new rate snapshot and resets.
    pub fn set_rate(&mut self, rate: RateConfig) {
        self.rate = rate;
        self.apply_config();
        self.reset();
    }

    pub fn rate(&self) -> RateConfig {
        self.rate
    }

    pub fn reset(&mut self) {
        self.reset_with(RESET_AMPLITUDE, RESET_FREQUENCY_HZ);
    }

    /// Resets to the given envelope and frequency (in hertz) and exports a
    /// silent two-sample cycle. No-op without buffers.
    pub fn reset_with(&mut self, amplitude: f32, frequency_hz: f32) {
        let Some(slots) = self.slots.as_mut() else {
            return;
        };
        self.amplitude = amplitude;
        self.frequency = self.rate.hz_to_unsigned(frequency_hz);
        self.armed = false;
        self.crossings = 0;
        self.expect_peak = self.config.inverted;
        self.capture_len = 0;
        self.peak = 0.0;
        self.live = 0;
        self.playback_len = 2;
        slots[0][0] = 0.0;
        slots[0][1] = 0.0;
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Replaces every setting at once.
    pub fn set_config(&mut self, config: AnalyzerConfig) {
        let rearm = config.inverted != self.config.inverted;
        self.config = config;
        self.apply_config();
        if rearm {
            self.armed = false;
        }
    }

    pub fn set_attack_lag(&mut self, lag: f32) {
        self.config.attack_lag = lag;
        self.attack_weight = self.envelope_weight(lag);
    }

    pub fn set_decay_lag(&mut self, lag: f32) {
        self.config.decay_lag = lag;
        self.decay_weight = self.envelope_weight(lag);
    }

    pub fn set_amp_gate(&mut self, level: f32) {
        self.config.amp_gate = level;
    }

    pub fn set_sample_gate(&mut self, level: f32) {
        self.config.sample_gate = level;
    }

    pub fn set_high_trigger(&mut self, level: f32) {
        self.config.high_trigger = level;
    }

    pub fn set_low_trigger(&mut self, level: f32) {
        self.config.low_trigger = level;
    }

    pub fn set_min_frequency(&mut self, hz: f32) {
        self.config.min_frequency = hz;
        self.update_cycle_bounds();
    }

    pub fn set_max_frequency(&mut self, hz: f32) {
        self.config.max_frequency = hz;
        self.update_cycle_bounds();
    }

    pub fn set_frequency_lag(&mut self, lag: f32) {
        self.config.frequency_lag = lag;
        self.frequency_weight = 1.0 - lag;
    }

    pub fn set_wave_lag(&mut self, lag: f32) {
        self.config.wave_lag = lag;
        self.wave_weight = 1.0 - lag;
    }

    /// Flips the end-of-cycle direction. Disarms until the gates open again.
    pub fn set_inverted(&mut self, inverted: bool) {
        self.config.inverted = inverted;
        self.end_of_cycle = end_of_cycle_pattern(inverted);
        self.armed = false;
    }

    pub fn set_interpolation(&mut self, interpolation: bool) {
        self.config.interpolation = interpolation;
    }

    /// Shortest cycle, in samples including the wraparound sample.
    pub fn min_cycle(&self) -> usize {
        self.min_cycle
    }

    /// Longest cycle before a forced end.
    pub fn max_cycle(&self) -> usize {
        self.max_cycle
    }

    /// Envelope estimate.
    #[inline]
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Frequency estimate in unsigned units.
    #[inline]
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Whether cycle detection is running, i.e. the input is above the gates.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Cycles completed since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Latest exported cycle.
    #[inline]
    pub fn wavetable(&self) -> Wavetable<'_> {
        match &self.slots {
            Some(slots) => Wavetable::new(
                &slots[self.live][..self.playback_len],
                self.config.interpolation,
            ),
            None => Wavetable::silent(),
        }
    }

    /// Feeds one input sample.
    #[inline]
    pub fn add_sample(&mut self, x: f32) {
        let magnitude = x.abs();
        let weight = if magnitude > self.amplitude {
            self.attack_weight
        } else {
            self.decay_weight
        };
        self.amplitude =
            (self.amplitude + weight * (magnitude - self.amplitude)).max(DENORMAL_FLOOR);

        let Some(slots) = self.slots.as_mut() else {
            return;
        };

        if !self.armed {
            if self.amplitude > self.config.amp_gate || magnitude > self.config.sample_gate {
                self.armed = true;
                self.crossings = 0;
                self.expect_peak = self.config.inverted;
                self.capture_len = 0;
                self.peak = magnitude;
            } else {
                return;
            }
        } else if self.amplitude < self.config.amp_gate && magnitude < self.config.sample_gate {
            self.armed = false;
            return;
        }

        let capture = &mut slots[1 - self.live];
        capture[self.capture_len] = x;
        self.capture_len += 1;
        if magnitude > self.peak {
            self.peak = magnitude;
        }

        // A forced end at the maximum length also clears any partial
        // hysteresis progress.
        if self.capture_len >= self.max_cycle {
            self.end_cycle(x, magnitude);
        } else if self.crossings > 1 {
            if self.capture_len >= self.min_cycle {
                let previous = capture[self.capture_len - 2];
                if SignPair::of(previous, x) == self.end_of_cycle {
                    self.end_cycle(x, magnitude);
                }
            }
        } else if self.crossed_threshold(x) {
            self.expect_peak = !self.expect_peak;
            self.crossings += 1;
        }
    }

    #[inline]
    fn crossed_threshold(&self, x: f32) -> bool {
        if self.expect_peak {
            x > self.amplitude * self.config.high_trigger
        } else {
            x < self.amplitude * self.config.low_trigger
        }
    }

    fn end_cycle(&mut self, x: f32, magnitude: f32) {
        self.crossings = 0;
        self.expect_peak = self.config.inverted;

        let Some(slots) = self.slots.as_mut() else {
            return;
        };
        let len = self.capture_len;

        let target = self
            .rate
            .hz_to_unsigned(self.rate.sample_rate() / (len - 1) as f32);
        self.frequency += self.frequency_weight * (target - self.frequency);

        let (playback, capture) = split_slots(slots, self.live);
        let cycle = &mut capture[..len];
        normalize_cycle(cycle, self.amplitude, self.peak);

        if self.wave_weight < 1.0 {
            let previous = Wavetable::new(&playback[..self.playback_len], self.config.interpolation);
            let step = 2.0 / len as f32;
            let mut phase = -1.0;
            for s in cycle.iter_mut() {
                let old = previous.value(phase);
                let v = old + self.wave_weight * (*s - old);
                *s = v.abs().max(DENORMAL_FLOOR).copysign(v);
                phase += step;
            }
        }

        self.live = 1 - self.live;
        self.playback_len = len;
        self.cycles += 1;

        // The closing sample also opens the next cycle.
        playback[0] = x;
        self.capture_len = 1;
        self.peak = magnitude;
    }

    fn envelope_weight(&self, lag: f32) -> f32 {
        1.0 - lag.powf(self.rate.weight_modifier())
    }

    fn apply_config(&mut self) {
        self.attack_weight = self.envelope_weight(self.config.attack_lag);
        self.decay_weight = self.envelope_weight(self.config.decay_lag);
        self.frequency_weight = 1.0 - self.config.frequency_lag;
        self.wave_weight = 1.0 - self.config.wave_lag;
        self.end_of_cycle = end_of_cycle_pattern(self.config.inverted);
        self.update_cycle_bounds();
    }

    fn update_cycle_bounds(&mut self) {
        let sample_rate = self.rate.sample_rate();
        let max_hz = self.rate.max_frequency();

        let min_hz = self.config.min_frequency.min(max_hz);
        let longest = (sample_rate / min_hz + 0.5) as usize + 1;
        self.max_cycle = longest.min(self.capacity).max(2);

        let max_cycle_hz = self.config.max_frequency.min(max_hz);
        self.min_cycle = ((sample_rate / max_cycle_hz + 0.5) as usize + 1).max(2);
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("capacity", &self.capacity)
            .field("amplitude", &self.amplitude)
            .field("frequency", &self.frequency)
            .field("armed", &self.armed)
            .field("playback_len", &self.playback_len)
            .finish()
    }
}

fn end_of_cycle_pattern(inverted: bool) -> SignPair {
    if inverted {
        SignPair::NegPos
    } else {
        SignPair::PosNeg
    }
}

/// Splits the arena into (playback, capture).
fn split_slots(slots: &mut [PoolBuffer<f32>; 2], live: usize) -> (&mut [f32], &mut [f32]) {
    let (first, second) = slots.split_at_mut(1);
    if live == 0 {
        (&mut first[0][..], &mut second[0][..])
    } else {
        (&mut second[0][..], &mut first[0][..])
    }
}
