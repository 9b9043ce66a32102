//! Display-side scope monitor thread
//!
//! Polls a [`ScopeReader`] at a fixed frame rate on a named background
//! thread and logs waveform summaries. This is the non-real-time consumer
//! of the scope queue: being late only makes the trace stale, and an
//! empty poll is a normal cycle, not an error.

use echoscope_core::ScopeReader;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default display refresh rate
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// How often the monitor logs a status summary
const STATUS_INTERVAL: Duration = Duration::from_secs(5);

/// Handle returned by [`ScopeMonitor::start`] to observe and stop the
/// monitor thread
pub struct MonitorHandle {
    stop_flag: Arc<AtomicBool>,
    /// Frames received from the queue, updated by the monitor thread
    frames_received: Arc<AtomicU64>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl MonitorHandle {
    /// Stop the monitor thread and wait for it to finish
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Release);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    /// Check if the monitor thread is still alive
    pub fn is_alive(&self) -> bool {
        self.thread
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Frames received from the scope queue so far
    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::Relaxed)
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Scope consumer running on its own timer thread
pub struct ScopeMonitor {
    frame_rate: u32,
}

impl ScopeMonitor {
    /// Create a monitor polling at the given frame rate (clamped to 1..=240)
    pub fn new(frame_rate: u32) -> Self {
        Self {
            frame_rate: frame_rate.clamp(1, 240),
        }
    }

    /// Spawn the monitor thread consuming from `reader`
    pub fn start(self, reader: ScopeReader) -> MonitorHandle {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let flag_clone = Arc::clone(&stop_flag);
        let frames_received = Arc::new(AtomicU64::new(0));
        let frames_clone = Arc::clone(&frames_received);

        let thread = std::thread::Builder::new()
            .name("scope-monitor".into())
            .spawn(move || {
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    self.monitor_loop(reader, flag_clone, frames_clone);
                }));
                match result {
                    Ok(()) => tracing::info!("Scope monitor thread exited normally"),
                    Err(panic_info) => {
                        let msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                            s.to_string()
                        } else if let Some(s) = panic_info.downcast_ref::<String>() {
                            s.clone()
                        } else {
                            "unknown panic".to_string()
                        };
                        tracing::error!(panic = %msg, "Scope monitor thread PANICKED");
                    }
                }
            })
            .expect("Failed to spawn scope monitor thread");

        MonitorHandle {
            stop_flag,
            frames_received,
            thread: Some(thread),
        }
    }

    fn monitor_loop(
        &self,
        mut reader: ScopeReader,
        stop_flag: Arc<AtomicBool>,
        frames_received: Arc<AtomicU64>,
    ) {
        let frame_interval = Duration::from_secs(1) / self.frame_rate;
        let mut status_logged_at = Instant::now();

        tracing::info!(frame_rate = self.frame_rate, "Scope monitor thread running");

        loop {
            if stop_flag.load(Ordering::Acquire) {
                break;
            }

            if reader.refresh() {
                frames_received.store(reader.frames_received(), Ordering::Relaxed);
                tracing::trace!(
                    peak = reader.peak(),
                    rms = reader.rms(),
                    "fresh scope frame"
                );
            }

            if status_logged_at.elapsed() >= STATUS_INTERVAL {
                tracing::info!(
                    frames = reader.frames_received(),
                    peak = reader.peak(),
                    rms = reader.rms(),
                    "Scope monitor stats"
                );
                status_logged_at = Instant::now();
            }

            std::thread::sleep(frame_interval);
        }

        tracing::info!(
            frames = reader.frames_received(),
            "Scope monitor stopped"
        );
    }
}
