//! Trigger-synchronized waveform capture
//!
//! Watches the render thread's sample stream for a rising edge through a
//! fixed threshold and, once triggered, collects exactly one block of
//! samples starting at the triggering sample before handing the block to
//! the scope queue. Starting every captured block at the same edge is what
//! keeps a periodic waveform stationary on screen instead of jittering
//! left and right on each refresh.

use std::sync::Arc;

use crate::scope::queue::ScopeBlockQueue;
use crate::TRIGGER_LEVEL;

/// Previous-sample value installed after a completed capture
///
/// Guaranteed above any real signal level, so the first samples of the
/// next call can never fabricate a rising edge at the capture seam.
const PREV_SAMPLE_SENTINEL: f32 = 100.0;

/// Capture phase of the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Scanning for a rising edge through the trigger level
    WaitingForTrigger,
    /// Filling the scratch block with post-trigger samples
    Collecting,
}

/// Waveform capture state machine
///
/// Runs entirely on the real-time producer thread; `process` never blocks
/// and never allocates. The machine is resumable: a call may consume a
/// partial stream and leave the capture pending for the next call.
///
/// Absence of a trigger is idle behavior, not an error - samples are
/// silently discarded until an edge arrives.
pub struct ScopeCollector {
    /// Destination queue; shared with the display-side consumer
    queue: Arc<ScopeBlockQueue>,
    /// Scratch block being filled, one queue block in size
    scratch: Vec<f32>,
    /// Samples collected into the scratch block so far
    collected: usize,
    /// Previously observed sample, for edge detection
    prev_sample: f32,
    /// Trigger threshold
    trigger_level: f32,
    /// Current capture phase
    state: CaptureState,
}

impl ScopeCollector {
    /// Create a collector pushing into `queue` at the default trigger level
    pub fn new(queue: Arc<ScopeBlockQueue>) -> Self {
        Self::with_trigger_level(queue, TRIGGER_LEVEL)
    }

    /// Create a collector with an explicit trigger level
    pub fn with_trigger_level(queue: Arc<ScopeBlockQueue>, trigger_level: f32) -> Self {
        let block_size = queue.block_size();
        Self {
            queue,
            scratch: vec![0.0; block_size],
            collected: 0,
            prev_sample: PREV_SAMPLE_SENTINEL,
            trigger_level,
            state: CaptureState::WaitingForTrigger,
        }
    }

    /// Feed a run of samples through the state machine
    ///
    /// While waiting, scans for a sample at or above the trigger level
    /// whose predecessor was below it - a rising-edge crossing, not merely
    /// "above threshold", so a plateau cannot retrigger mid-hold. The
    /// triggering sample becomes the first sample of the capture.
    ///
    /// While collecting, appends samples until the scratch block is full,
    /// then pushes it to the queue (dropped silently if the queue is
    /// full), resets to waiting, and discards the remainder of this call's
    /// samples; at most one block completes per call.
    pub fn process(&mut self, samples: &[f32]) {
        let mut index = 0;

        if self.state == CaptureState::WaitingForTrigger {
            while index < samples.len() {
                let current = samples[index];
                if current >= self.trigger_level && self.prev_sample < self.trigger_level {
                    self.collected = 0;
                    self.state = CaptureState::Collecting;
                    // Leave `index` on the triggering sample so it opens
                    // the captured block.
                    break;
                }
                self.prev_sample = current;
                index += 1;
            }
        }

        if self.state == CaptureState::Collecting {
            while index < samples.len() {
                self.scratch[self.collected] = samples[index];
                self.collected += 1;
                index += 1;

                if self.collected == self.scratch.len() {
                    if !self.queue.push_block(&self.scratch) {
                        tracing::trace!("scope queue full, capture dropped");
                    }
                    self.state = CaptureState::WaitingForTrigger;
                    self.prev_sample = PREV_SAMPLE_SENTINEL;
                    break;
                }
            }
        }
    }

    /// Current capture phase
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Trigger threshold in use
    pub fn trigger_level(&self) -> f32 {
        self.trigger_level
    }

    /// Samples collected into the pending block so far
    pub fn collected(&self) -> usize {
        self.collected
    }
}
