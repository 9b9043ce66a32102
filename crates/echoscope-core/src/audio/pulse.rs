//! Periodic test tone source
//!
//! Generates a short decaying sine ping once per cycle, leaving the rest of
//! the cycle silent so the echo repeats are clearly audible and the scope
//! trigger sees one clean rising edge per ping.

/// Ping oscillation frequency in Hz
const PING_FREQUENCY_HZ: f32 = 440.0;

/// Ping duration as a fraction of the cycle (50ms of a 1s cycle)
const PING_SECONDS: f32 = 0.05;

/// Exponential decay rate for the ping envelope (1/seconds)
const PING_DECAY_RATE: f32 = 60.0;

/// Ping amplitude (-6dB for headroom over the echo tail)
const PING_AMPLITUDE: f32 = 0.5;

/// Default cycle duration in seconds
const CYCLE_SECONDS: f32 = 1.0;

/// Decaying-sine ping generator
///
/// # Example
/// ```
/// use echoscope_core::audio::pulse::PulseGenerator;
///
/// let mut gen = PulseGenerator::new(48000);
/// assert_eq!(gen.cycle_length(), 48000); // 1s at 48kHz
/// let _sample = gen.next_sample();
/// ```
#[derive(Debug)]
pub struct PulseGenerator {
    /// Sample rate in Hz
    sample_rate: u32,
    /// Total cycle length in samples
    cycle_length: usize,
    /// Ping length in samples (ping occupies the start of the cycle)
    ping_length: usize,
    /// Current position in cycle (0..cycle_length)
    cycle_position: usize,
    /// Amplitude scaling factor
    amplitude: f32,
}

impl PulseGenerator {
    /// Create a generator with a 1-second cycle at the given rate
    pub fn new(sample_rate: u32) -> Self {
        let sample_rate = sample_rate.max(1);
        let cycle_length = ((sample_rate as f32 * CYCLE_SECONDS) as usize).max(1);
        let ping_length = ((sample_rate as f32 * PING_SECONDS) as usize).min(cycle_length);

        Self {
            sample_rate,
            cycle_length,
            ping_length,
            cycle_position: 0,
            amplitude: PING_AMPLITUDE,
        }
    }

    /// Get the next sample from the generator
    ///
    /// Returns a decaying sine during the ping window at the start of each
    /// cycle, silence for the remainder.
    pub fn next_sample(&mut self) -> f32 {
        let sample = if self.cycle_position < self.ping_length {
            let t = self.cycle_position as f32 / self.sample_rate as f32;
            let envelope = (-t * PING_DECAY_RATE).exp();
            (std::f32::consts::TAU * PING_FREQUENCY_HZ * t).sin() * envelope * self.amplitude
        } else {
            0.0
        };

        self.cycle_position = (self.cycle_position + 1) % self.cycle_length;
        sample
    }

    /// Fill a buffer with sequential samples
    pub fn fill_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// Get cycle length in samples
    pub fn cycle_length(&self) -> usize {
        self.cycle_length
    }

    /// Get ping length in samples
    pub fn ping_length(&self) -> usize {
        self.ping_length
    }

    /// Get current position in cycle
    pub fn position(&self) -> usize {
        self.cycle_position
    }

    /// Check if currently inside the ping window
    pub fn in_ping(&self) -> bool {
        self.cycle_position < self.ping_length
    }

    /// Reset generator to the start of the cycle
    pub fn reset(&mut self) {
        self.cycle_position = 0;
    }

    /// Set amplitude scaling factor, clamped to 0.0..=1.0
    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude.clamp(0.0, 1.0);
    }

    /// Get current amplitude
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_and_ping_lengths() {
        let gen = PulseGenerator::new(48000);
        assert_eq!(gen.cycle_length(), 48000);
        assert_eq!(gen.ping_length(), 2400);
    }

    #[test]
    fn test_silence_outside_ping_window() {
        let mut gen = PulseGenerator::new(48000);
        let mut buffer = vec![0.0f32; 48000];
        gen.fill_buffer(&mut buffer);

        for (i, &sample) in buffer.iter().enumerate().skip(gen.ping_length()) {
            assert_eq!(sample, 0.0, "expected silence at sample {}", i);
        }
    }

    #[test]
    fn test_ping_has_energy() {
        let mut gen = PulseGenerator::new(48000);
        let mut buffer = vec![0.0f32; 2400];
        gen.fill_buffer(&mut buffer);

        let peak = buffer.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
        assert!(peak > 0.1, "ping peak too small: {}", peak);
    }

    #[test]
    fn test_amplitude_bounded() {
        let mut gen = PulseGenerator::new(48000);
        let mut buffer = vec![0.0f32; 48000];
        gen.fill_buffer(&mut buffer);

        for &sample in &buffer {
            assert!(sample.abs() <= gen.amplitude());
        }
    }

    #[test]
    fn test_periodicity() {
        let mut gen = PulseGenerator::new(8000);
        let len = gen.cycle_length();
        let cycle1: Vec<f32> = (0..len).map(|_| gen.next_sample()).collect();
        let cycle2: Vec<f32> = (0..len).map(|_| gen.next_sample()).collect();
        assert_eq!(cycle1, cycle2, "cycles should repeat exactly");
    }

    #[test]
    fn test_reset() {
        let mut gen = PulseGenerator::new(48000);
        for _ in 0..1000 {
            gen.next_sample();
        }
        gen.reset();
        assert_eq!(gen.position(), 0);
        assert!(gen.in_ping());
    }
}
