//! Echoscope - standalone echo effect monitor
//!
//! This library re-exports the echo engine and scope pipeline from
//! `echoscope-core` and adds the application-side glue: persistent JSON
//! configuration and the display-side monitor thread.

pub mod config;
pub mod monitor;

pub use echoscope_core::audio;
pub use echoscope_core::scope;

pub use echoscope_core::{
    AudioEngine, EchoParams, EchoUnit, MultiTapDelay, PulseGenerator, ScopeBlockQueue,
    ScopeCollector, ScopeReader,
};
pub use echoscope_core::{
    DEFAULT_SAMPLE_RATE, SCOPE_BLOCK_ORDER, SCOPE_BLOCK_SIZE, SCOPE_QUEUE_BLOCKS, TRIGGER_LEVEL,
    VERSION,
};
