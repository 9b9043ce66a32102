//! Audio engine for device management and the render callback
//!
//! Hosts the real-time producer path: a cpal output stream whose callback
//! runs pulse source -> echo delay -> scope capture, one sample at a time.
//! Everything the callback touches is moved into the closure or shared
//! through lock-free primitives; the callback itself never locks, blocks,
//! or allocates.
//!
//! ## Shutdown ordering
//!
//! The scope queue is created with the engine and shared out as an `Arc`,
//! so it outlives both the render thread and any consumer holding a clone.
//! `stop()` halts the callback before the stream is dropped; consumers are
//! expected to stop before the engine is destroyed.

use crate::audio::echo::{EchoParams, EchoUnit};
use crate::audio::pulse::PulseGenerator;
use crate::scope::collector::ScopeCollector;
use crate::scope::queue::ScopeBlockQueue;
use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, SampleRate, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Capacity of the control-to-callback parameter channel
const PARAM_CHANNEL_CAPACITY: usize = 16;

/// Mono scratch capacity for per-callback scope capture
const CALLBACK_SCRATCH: usize = 8192;

/// Errors that can occur during audio engine operations
#[derive(Error, Debug)]
pub enum AudioEngineError {
    #[error("No audio devices found")]
    NoDevicesFound,

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to open stream: {0}")]
    StreamError(String),

    #[error("No output channels available")]
    NoOutputChannels,
}

/// Audio device information
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Device name
    pub name: String,
    /// Whether this is the default output device
    pub is_default: bool,
    /// Supported sample rates
    pub sample_rates: Vec<u32>,
    /// Number of output channels
    pub output_channels: u16,
}

/// Audio engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Engine is stopped
    Stopped,
    /// Engine is running and rendering audio
    Running,
}

/// Audio engine owning the render stream and the scope queue
pub struct AudioEngine {
    state: EngineState,
    sample_rate: u32,
    device_name: Option<String>,
    host: Option<Host>,
    device: Option<Device>,
    output_stream: Option<Stream>,
    /// Scope queue shared with display-side consumers
    scope_queue: Arc<ScopeBlockQueue>,
    /// Echo parameters; sent into the callback when running
    echo_params: EchoParams,
    /// Sender half of the parameter channel (present while running)
    param_tx: Option<crossbeam_channel::Sender<EchoParams>>,
    /// Running flag (shared with the callback via Arc)
    running: Option<Arc<AtomicBool>>,
    /// Rendered sample counter (shared with the callback via Arc)
    samples_rendered: Option<Arc<AtomicUsize>>,
}

impl AudioEngine {
    /// Create a new engine with default parameters and a fresh scope queue
    pub fn new() -> Self {
        Self {
            state: EngineState::Stopped,
            sample_rate: crate::DEFAULT_SAMPLE_RATE,
            device_name: None,
            host: None,
            device: None,
            output_stream: None,
            scope_queue: Arc::new(ScopeBlockQueue::with_defaults()),
            echo_params: EchoParams::default(),
            param_tx: None,
            running: None,
            samples_rendered: None,
        }
    }

    /// Get current engine state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Get configured sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Set sample rate (must be called before start)
    pub fn set_sample_rate(&mut self, rate: u32) {
        if (8000..=384000).contains(&rate) {
            self.sample_rate = rate;
        }
    }

    /// Handle to the scope queue for display-side consumers
    ///
    /// Valid for the engine's whole lifetime; consumers keep their clone
    /// across engine start/stop cycles.
    pub fn scope_queue(&self) -> Arc<ScopeBlockQueue> {
        Arc::clone(&self.scope_queue)
    }

    /// List available output devices
    pub fn list_devices() -> Result<Vec<DeviceInfo>> {
        let host = cpal::default_host();
        let mut devices = Vec::new();

        let default_output = host.default_output_device().and_then(|d| d.name().ok());

        for device in host.output_devices()? {
            let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
            let is_default = default_output.as_deref() == Some(name.as_str());

            let output_channels = device
                .default_output_config()
                .map(|c| c.channels())
                .unwrap_or(0);

            let common_rates = [44100, 48000, 88200, 96000, 176400, 192000];
            let mut sample_rates = Vec::new();
            if let Ok(configs) = device.supported_output_configs() {
                for config in configs {
                    for &rate in &common_rates {
                        if (config.min_sample_rate().0..=config.max_sample_rate().0).contains(&rate)
                            && !sample_rates.contains(&rate)
                        {
                            sample_rates.push(rate);
                        }
                    }
                }
            }
            sample_rates.sort();

            devices.push(DeviceInfo {
                name,
                is_default,
                sample_rates,
                output_channels,
            });
        }

        if devices.is_empty() {
            return Err(AudioEngineError::NoDevicesFound.into());
        }

        Ok(devices)
    }

    /// Select an output device by name
    pub fn select_device(&mut self, name: &str) -> Result<()> {
        let host = cpal::default_host();

        let device = host
            .output_devices()?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| AudioEngineError::DeviceNotFound(name.to_string()))?;

        self.host = Some(host);
        self.device = Some(device);
        self.device_name = Some(name.to_string());

        Ok(())
    }

    /// Select the host's default output device
    pub fn select_default_device(&mut self) -> Result<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioEngineError::NoDevicesFound)?;
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        self.host = Some(host);
        self.device = Some(device);
        self.device_name = Some(name);

        Ok(())
    }

    /// Get the selected device name
    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    /// Set echo parameters
    ///
    /// While running the update travels to the callback over the bounded
    /// parameter channel; a full channel simply drops the update, and the
    /// next one wins.
    pub fn set_echo_params(&mut self, params: EchoParams) {
        self.echo_params = params;
        if let Some(ref tx) = self.param_tx {
            if tx.try_send(params).is_err() {
                tracing::warn!("parameter channel full, echo update dropped");
            }
        }
    }

    /// Current echo parameters
    pub fn echo_params(&self) -> EchoParams {
        self.echo_params
    }

    /// Start audio rendering on the selected device
    pub fn start(&mut self) -> Result<()> {
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| anyhow!("No device selected"))?;

        let default_output = device
            .default_output_config()
            .map_err(|e| AudioEngineError::StreamError(e.to_string()))?;

        let output_channels = default_output.channels();
        if output_channels == 0 {
            return Err(AudioEngineError::NoOutputChannels.into());
        }

        // Try the configured rate first, fall back to the device default.
        let device_rate = default_output.sample_rate().0;
        let rates_to_try = if device_rate != self.sample_rate {
            vec![self.sample_rate, device_rate]
        } else {
            vec![self.sample_rate]
        };

        let mut config = StreamConfig {
            channels: output_channels,
            sample_rate: SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let mut effective_rate = self.sample_rate;
        for &rate in &rates_to_try {
            config.sample_rate = SampleRate(rate);
            match device.build_output_stream(
                &config,
                |_: &mut [f32], _: &cpal::OutputCallbackInfo| {},
                |_| {},
                None,
            ) {
                Ok(_stream) => {
                    effective_rate = rate;
                    if rate != self.sample_rate {
                        tracing::warn!(
                            configured = self.sample_rate,
                            effective = rate,
                            "configured sample rate failed, using device default"
                        );
                    }
                    break;
                }
                Err(e) => {
                    tracing::warn!(rate, error = %e, "sample rate probe failed");
                    continue;
                }
            }
        }
        config.sample_rate = SampleRate(effective_rate);

        // Everything the callback owns is built here and moved in.
        let mut pulse = PulseGenerator::new(effective_rate);
        let mut echo = EchoUnit::new(effective_rate, self.echo_params);
        let mut collector = ScopeCollector::new(Arc::clone(&self.scope_queue));
        let mut scratch = vec![0.0f32; CALLBACK_SCRATCH];

        let (param_tx, param_rx) = crossbeam_channel::bounded::<EchoParams>(PARAM_CHANNEL_CAPACITY);

        let running = Arc::new(AtomicBool::new(true));
        let samples_rendered = Arc::new(AtomicUsize::new(0));

        let cb_running = Arc::clone(&running);
        let cb_samples = Arc::clone(&samples_rendered);
        let num_channels = output_channels as usize;

        let output_stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                if !cb_running.load(Ordering::Relaxed) {
                    data.fill(0.0);
                    return;
                }

                // Parameter updates arrive lock-free; apply before rendering.
                while let Ok(params) = param_rx.try_recv() {
                    echo.update_parameters(params);
                }

                let mut captured = 0usize;
                let mut frame_count = 0usize;
                for frame in data.chunks_mut(num_channels) {
                    let dry = pulse.next_sample();
                    let wet = echo.tick(dry).clamp(-1.0, 1.0);
                    for channel in frame.iter_mut() {
                        *channel = wet;
                    }

                    scratch[captured] = wet;
                    captured += 1;
                    if captured == scratch.len() {
                        collector.process(&scratch[..captured]);
                        captured = 0;
                    }
                    frame_count += 1;
                }
                collector.process(&scratch[..captured]);

                let prev = cb_samples.fetch_add(frame_count, Ordering::Relaxed);
                if prev == 0 {
                    tracing::info!(
                        frames = frame_count,
                        channels = num_channels,
                        "output callback started"
                    );
                }
            },
            move |err| {
                tracing::error!("Output stream error: {}", err);
            },
            None,
        )?;

        output_stream.play()?;

        self.output_stream = Some(output_stream);
        self.param_tx = Some(param_tx);
        self.running = Some(running);
        self.samples_rendered = Some(samples_rendered);
        self.sample_rate = effective_rate;
        self.state = EngineState::Running;

        tracing::info!(
            device = self.device_name.as_deref().unwrap_or("unknown"),
            sample_rate = effective_rate,
            "Audio engine started"
        );

        Ok(())
    }

    /// Stop audio rendering
    ///
    /// Silences the callback before the stream is torn down, so shutdown
    /// never races a live render pass.
    pub fn stop(&mut self) -> Result<()> {
        if let Some(ref running) = self.running {
            running.store(false, Ordering::Relaxed);
        }

        self.output_stream = None;
        self.param_tx = None;
        self.running = None;
        self.samples_rendered = None;
        self.state = EngineState::Stopped;

        tracing::info!("Audio engine stopped");

        Ok(())
    }

    /// Samples rendered since start, for status display
    pub fn samples_rendered(&self) -> usize {
        self.samples_rendered
            .as_ref()
            .map(|s| s.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
