//! Echoscope Core - echo delay engine and waveform scope pipeline
//!
//! This library provides the real-time signal path of the echoscope monitor:
//! a multi-tap decaying delay line that runs sample-accurately inside the
//! audio callback, and a lock-free single-producer/single-consumer block
//! queue that moves trigger-synchronized waveform captures from the render
//! thread to a non-real-time display thread.

pub mod audio;
pub mod scope;

pub use audio::delay::MultiTapDelay;
pub use audio::echo::{EchoParams, EchoUnit};
pub use audio::engine::AudioEngine;
pub use audio::pulse::PulseGenerator;
pub use scope::collector::ScopeCollector;
pub use scope::queue::ScopeBlockQueue;
pub use scope::reader::ScopeReader;

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default sample rate for audio processing
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Scope block size exponent (block size = 2^ORDER samples)
pub const SCOPE_BLOCK_ORDER: u32 = 9;

/// Samples per scope block (512 at order 9)
///
/// At 48kHz one block spans ~10.7ms, a bit over four periods of a 440Hz
/// tone, which is enough context for a stable oscilloscope trace.
pub const SCOPE_BLOCK_SIZE: usize = 1 << SCOPE_BLOCK_ORDER;

/// Number of blocks held by the scope queue
pub const SCOPE_QUEUE_BLOCKS: usize = 5;

/// Amplitude threshold for the scope trigger edge
pub const TRIGGER_LEVEL: f32 = 0.001;
