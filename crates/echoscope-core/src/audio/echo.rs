//! Per-sample echo wet path
//!
//! Thin wrapper that drives [`MultiTapDelay`] the way the audio callback
//! needs it driven: write the dry sample with the current echo level, sum
//! the repeat taps into a wet signal, advance the cursor exactly once.
//! Exists as its own unit so the render loop is testable without a device.

use crate::audio::delay::MultiTapDelay;

/// Echo parameter set delivered from the control thread
///
/// Values are expected to be pre-clamped to host ranges by the caller;
/// the unit only applies the defensive clamps the delay line itself has.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EchoParams {
    /// Echo cycle duration in seconds
    pub echo_seconds: f32,
    /// Number of echo repeats tracked (>= 1)
    pub tap_count: usize,
    /// Per-repeat attenuation, 0.0..=1.0
    pub level: f32,
}

impl Default for EchoParams {
    fn default() -> Self {
        Self {
            echo_seconds: 0.25,
            tap_count: 3,
            level: 0.5,
        }
    }
}

/// Echo processor for one mono signal path
#[derive(Debug)]
pub struct EchoUnit {
    delay: MultiTapDelay,
    level: f32,
}

impl EchoUnit {
    /// Create an echo unit at the given sample rate
    pub fn new(sample_rate: u32, params: EchoParams) -> Self {
        Self {
            delay: MultiTapDelay::new(sample_rate, params.echo_seconds, params.tap_count),
            level: params.level.clamp(0.0, 1.0),
        }
    }

    /// Apply new parameters; the delay only resets on a real change
    pub fn update_parameters(&mut self, params: EchoParams) {
        self.level = params.level.clamp(0.0, 1.0);
        self.delay
            .update_parameters(params.echo_seconds, params.tap_count);
    }

    /// Process one dry sample, returning dry plus the echo taps
    ///
    /// Tap 0 immediately after the write is just the attenuated dry
    /// sample, so the wet sum starts at tap 1; echo `k` arrives `k` cycles
    /// late, attenuated by `level` once per shift.
    pub fn tick(&mut self, dry: f32) -> f32 {
        self.delay.write_sample(dry, self.level);

        let mut wet = 0.0;
        for k in 1..self.delay.tap_count() {
            wet += self.delay.read_tap(k);
        }
        self.delay.advance();

        dry + wet
    }

    /// Process a mono buffer in place
    pub fn process(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.tick(*sample);
        }
    }

    /// Access the underlying delay line
    pub fn delay(&self) -> &MultiTapDelay {
        &self.delay
    }

    /// Current per-repeat level
    pub fn level(&self) -> f32 {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn unit(rate: u32, seconds: f32, taps: usize, level: f32) -> EchoUnit {
        EchoUnit::new(
            rate,
            EchoParams {
                echo_seconds: seconds,
                tap_count: taps,
                level,
            },
        )
    }

    #[test]
    fn test_dry_passes_through_unchanged() {
        let mut echo = unit(48000, 0.25, 3, 0.5);
        // Nothing in the history yet, so the first cycle is dry only.
        assert_abs_diff_eq!(echo.tick(0.8), 0.8);
        assert_abs_diff_eq!(echo.tick(-0.3), -0.3);
    }

    #[test]
    fn test_impulse_echoes_at_cycle_offsets() {
        // 8-sample cycle: an impulse comes back at +8 scaled by level^2
        // (once at write, once at the shift) and at +16 by level^3.
        let mut echo = unit(8, 1.0, 3, 0.5);
        let mut out = vec![0.0f32; 24];
        out[0] = 1.0;
        echo.process(&mut out);

        assert_abs_diff_eq!(out[0], 1.0);
        assert_abs_diff_eq!(out[8], 0.25);
        assert_abs_diff_eq!(out[16], 0.125);
        for (i, &s) in out.iter().enumerate() {
            if i != 0 && i != 8 && i != 16 {
                assert_abs_diff_eq!(s, 0.0);
            }
        }
    }

    #[test]
    fn test_single_tap_mixes_no_echo() {
        let mut echo = unit(8, 1.0, 1, 0.5);
        let mut out = vec![0.0f32; 16];
        out[0] = 1.0;
        echo.process(&mut out);
        assert_abs_diff_eq!(out[0], 1.0);
        for &s in &out[1..] {
            assert_abs_diff_eq!(s, 0.0);
        }
    }

    #[test]
    fn test_zero_echo_time_is_passthrough() {
        let mut echo = unit(48000, 0.0, 3, 0.5);
        for i in 0..64 {
            let x = (i as f32 * 0.1).sin();
            assert_abs_diff_eq!(echo.tick(x), x);
        }
    }

    #[test]
    fn test_update_parameters_reaches_delay() {
        let mut echo = unit(48000, 0.25, 3, 0.5);
        echo.update_parameters(EchoParams {
            echo_seconds: 0.5,
            tap_count: 4,
            level: 0.25,
        });
        assert_eq!(echo.delay().buffer_len(), 24000);
        assert_eq!(echo.delay().tap_count(), 4);
        assert_abs_diff_eq!(echo.level(), 0.25);
    }

    #[test]
    fn test_level_clamped() {
        let echo = unit(48000, 0.25, 3, 7.0);
        assert_abs_diff_eq!(echo.level(), 1.0);
    }
}
