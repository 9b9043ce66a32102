//! Audio processing module
//!
//! This module contains the real-time audio path:
//! - Multi-tap decaying delay line ([`delay`])
//! - Per-sample echo wet path ([`echo`])
//! - Periodic test tone source ([`pulse`])
//! - cpal device management and the render callback ([`engine`])

pub mod delay;
pub mod echo;
pub mod engine;
pub mod pulse;
