//! Display-side scope consumer
//!
//! Drains at most one captured block per refresh and keeps it as the
//! current frame for whatever surface draws it. Runs on a best-effort
//! timer thread (~30 Hz); being delayed arbitrarily only makes the display
//! stale, never incorrect, and finding the queue empty is a normal cycle.

use std::sync::Arc;

use crate::scope::queue::ScopeBlockQueue;

/// Timer-driven consumer of captured waveform blocks
pub struct ScopeReader {
    /// Source queue; shared with the render-thread producer
    queue: Arc<ScopeBlockQueue>,
    /// Most recently popped block
    frame: Vec<f32>,
    /// Blocks received since construction
    frames_received: u64,
}

impl ScopeReader {
    /// Create a reader consuming from `queue`, starting on a silent frame
    pub fn new(queue: Arc<ScopeBlockQueue>) -> Self {
        let block_size = queue.block_size();
        Self {
            queue,
            frame: vec![0.0; block_size],
            frames_received: 0,
        }
    }

    /// Pop at most one block into the current frame
    ///
    /// Returns `true` if a fresh block arrived. On an empty queue the
    /// previous frame is kept as-is, which reads on screen as a held
    /// trace rather than a blank one.
    pub fn refresh(&mut self) -> bool {
        if self.queue.pop_block(&mut self.frame) {
            self.frames_received += 1;
            true
        } else {
            false
        }
    }

    /// The current waveform frame
    pub fn samples(&self) -> &[f32] {
        &self.frame
    }

    /// Blocks received since construction
    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    /// Peak absolute amplitude of the current frame
    pub fn peak(&self) -> f32 {
        self.frame.iter().fold(0.0f32, |m, &s| m.max(s.abs()))
    }

    /// Root-mean-square level of the current frame
    pub fn rms(&self) -> f32 {
        if self.frame.is_empty() {
            return 0.0;
        }
        let sum_sq: f32 = self.frame.iter().map(|&s| s * s).sum();
        (sum_sq / self.frame.len() as f32).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_starts_silent() {
        let queue = Arc::new(ScopeBlockQueue::new(2, 8));
        let reader = ScopeReader::new(queue);
        assert_eq!(reader.samples(), &[0.0; 8]);
        assert_eq!(reader.frames_received(), 0);
        assert_abs_diff_eq!(reader.peak(), 0.0);
    }

    #[test]
    fn test_refresh_empty_keeps_frame() {
        let queue = Arc::new(ScopeBlockQueue::new(2, 4));
        queue.push_block(&[0.1, 0.2, 0.3, 0.4]);

        let mut reader = ScopeReader::new(Arc::clone(&queue));
        assert!(reader.refresh());
        assert_eq!(reader.samples(), &[0.1, 0.2, 0.3, 0.4]);

        // Empty queue: refresh reports nothing new, frame is held.
        assert!(!reader.refresh());
        assert_eq!(reader.samples(), &[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(reader.frames_received(), 1);
    }

    #[test]
    fn test_refresh_takes_one_block_per_call() {
        let queue = Arc::new(ScopeBlockQueue::new(3, 2));
        queue.push_block(&[1.0, 1.0]);
        queue.push_block(&[2.0, 2.0]);

        let mut reader = ScopeReader::new(Arc::clone(&queue));
        assert!(reader.refresh());
        assert_eq!(reader.samples(), &[1.0, 1.0]);
        assert_eq!(queue.len(), 1);

        assert!(reader.refresh());
        assert_eq!(reader.samples(), &[2.0, 2.0]);
    }

    #[test]
    fn test_levels() {
        let queue = Arc::new(ScopeBlockQueue::new(2, 4));
        queue.push_block(&[0.5, -0.5, 0.5, -0.5]);

        let mut reader = ScopeReader::new(queue);
        reader.refresh();
        assert_abs_diff_eq!(reader.peak(), 0.5);
        assert_abs_diff_eq!(reader.rms(), 0.5);
    }
}
