//! Multi-tap decaying delay line
//!
//! Stores the last `echo_seconds` of signal once per tap, where tap `k`
//! holds a copy of the signal from `k` echo cycles ago. On every write the
//! historical taps are shifted down the chain and attenuated, so decaying
//! echoes fall out of the structure without a feedback loop and without the
//! accumulation error a feedback path would collect.
//!
//! ## Real-time contract
//!
//! `write_sample`, `read_tap`, and `advance` never fail and never allocate
//! on the normal path. Stale or corrupted state (cursor out of range, a
//! parameter change, a zero-length buffer) is repaired in place by
//! [`MultiTapDelay::reinitialize`], trading one audible dropout for
//! crash-safety. Reinitialization is the only operation that touches the
//! allocator, and it only runs when parameters actually change or state is
//! judged corrupt - never on the steady-state per-sample path.

/// Parameter changes smaller than this are treated as no change at all,
/// so a host re-sending the current value does not wipe echo history.
const MIN_DELTA: f32 = 1.0e-4;

/// N-tap feedback-free echo store
///
/// Each tap owns a circular buffer of `buffer_len` samples, where
/// `buffer_len = floor(sample_rate * echo_seconds)`. A single write cursor
/// is shared by all taps and advances once per processed sample.
///
/// # Example
/// ```
/// use echoscope_core::audio::delay::MultiTapDelay;
///
/// let mut delay = MultiTapDelay::new(48000, 0.25, 3);
/// assert_eq!(delay.buffer_len(), 12000);
///
/// delay.write_sample(1.0, 0.5);
/// assert_eq!(delay.read_tap(0), 0.5);
/// delay.advance();
/// ```
#[derive(Debug)]
pub struct MultiTapDelay {
    /// Sample rate in Hz
    sample_rate: u32,
    /// Echo cycle duration in seconds
    echo_seconds: f32,
    /// Number of taps (echo repeats tracked)
    tap_count: usize,
    /// Per-tap circular sample buffers, each `buffer_len` long
    taps: Vec<Vec<f32>>,
    /// Samples per echo cycle, `floor(sample_rate * echo_seconds)`
    buffer_len: usize,
    /// Shared write cursor, always in `[0, buffer_len)` when healthy
    cursor: usize,
}

impl MultiTapDelay {
    /// Create a delay line for the given rate, echo time, and tap count
    ///
    /// `echo_seconds` of 0 is legal and means no delay capacity: every
    /// read returns silence until the parameters change.
    pub fn new(sample_rate: u32, echo_seconds: f32, tap_count: usize) -> Self {
        let mut delay = Self {
            sample_rate: sample_rate.max(1),
            echo_seconds: echo_seconds.max(0.0),
            tap_count: tap_count.max(1),
            taps: Vec::new(),
            buffer_len: 0,
            cursor: 0,
        };
        delay.reinitialize();
        delay
    }

    /// Rebuild all tap buffers from the current parameters
    ///
    /// Recomputes `buffer_len`, resizes and zero-fills every tap, and
    /// resets the cursor. Destroys all echo history; callers reach for
    /// this whenever state is stale, never silently skip it.
    pub fn reinitialize(&mut self) {
        self.buffer_len = (self.sample_rate as f64 * self.echo_seconds as f64).floor() as usize;
        self.taps = vec![vec![0.0; self.buffer_len]; self.tap_count];
        self.cursor = 0;

        tracing::debug!(
            buffer_len = self.buffer_len,
            tap_count = self.tap_count,
            "delay line reinitialized"
        );
    }

    /// Write one sample at the cursor, shifting the tap chain
    ///
    /// Tap `i` receives tap `i-1`'s buffered value times `amplitude`, for
    /// `i` from the top of the chain down to 1, then tap 0 receives
    /// `value * amplitude`. After this call tap `k` at the cursor holds the
    /// signal that was present `k` echo cycles ago, freshly attenuated.
    ///
    /// Note that the current call's `amplitude` is applied to every
    /// shifted tap, not just the newest sample, so an amplitude change
    /// reaches all historical taps on the next write. This matches the
    /// effect's decay-stacking behavior and is kept deliberately.
    ///
    /// A cursor at or past `buffer_len` is treated as corrupted state and
    /// repaired by reinitializing before the write; with a zero-length
    /// buffer the write itself is then skipped.
    pub fn write_sample(&mut self, value: f32, amplitude: f32) {
        if self.cursor >= self.buffer_len {
            self.reinitialize();
            if self.buffer_len == 0 {
                return;
            }
        }

        for i in (1..self.tap_count).rev() {
            self.taps[i][self.cursor] = self.taps[i - 1][self.cursor] * amplitude;
        }
        self.taps[0][self.cursor] = value * amplitude;
    }

    /// Read tap `repeat_index` at the cursor
    ///
    /// Out-of-range access (bad tap index, or a cursor past the end) never
    /// reads out of bounds: the line reinitializes and returns silence.
    pub fn read_tap(&mut self, repeat_index: usize) -> f32 {
        if repeat_index >= self.tap_count || self.cursor >= self.buffer_len {
            self.reinitialize();
            return 0.0;
        }
        self.taps[repeat_index][self.cursor]
    }

    /// Advance the write cursor by one sample, wrapping at `buffer_len`
    ///
    /// Call exactly once per processed sample, after all reads and writes
    /// for that sample. Wrapping here is proactive, so normal cyclic use
    /// never trips the self-healing paths in the accessors.
    pub fn advance(&mut self) {
        if self.buffer_len == 0 {
            return;
        }
        self.cursor += 1;
        if self.cursor == self.buffer_len {
            self.cursor = 0;
        }
    }

    /// Apply new echo parameters, reinitializing only on a real change
    ///
    /// "Real change" for the echo time means a difference of at least
    /// `MIN_DELTA`: control surfaces quantize the parameter in steps no
    /// finer than that, so anything smaller is a re-send of the current
    /// value, and a re-send must not wipe echo history.
    pub fn update_parameters(&mut self, echo_seconds: f32, tap_count: usize) {
        let echo_seconds = echo_seconds.max(0.0);
        let tap_count = tap_count.max(1);

        if (echo_seconds - self.echo_seconds).abs() < MIN_DELTA && tap_count == self.tap_count {
            return;
        }

        self.echo_seconds = echo_seconds;
        self.tap_count = tap_count;
        self.reinitialize();
    }

    /// Samples per echo cycle
    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }

    /// Current write cursor position
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of taps
    pub fn tap_count(&self) -> usize {
        self.tap_count
    }

    /// Echo cycle duration in seconds
    pub fn echo_seconds(&self) -> f32 {
        self.echo_seconds
    }

    /// Sample rate in Hz; changing it means constructing a new line
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
