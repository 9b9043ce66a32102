//! Waveform scope pipeline
//!
//! Moves trigger-synchronized waveform captures from the real-time render
//! thread to a non-real-time display thread:
//! - Lock-free SPSC block queue ([`queue`])
//! - Rising-edge trigger capture state machine ([`collector`])
//! - Timer-driven display-side consumer ([`reader`])

pub mod collector;
pub mod queue;
pub mod reader;
