//! Echoscope - standalone echo effect monitor
//!
//! Entry point: renders a periodic test ping through the multi-tap echo on
//! the selected output device and captures the wet waveform for the scope
//! monitor thread.

use anyhow::{bail, Result};
use echoscope::config::AppConfig;
use echoscope::monitor::{ScopeMonitor, DEFAULT_FRAME_RATE};
use echoscope::{AudioEngine, ScopeReader};
use std::time::Duration;
use tracing::{error, info};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("echoscope=info".parse().unwrap()),
        )
        .init();

    println!("Echoscope v{} - echo effect monitor", echoscope::VERSION);
    println!();

    let config_path = AppConfig::path();
    let mut config = AppConfig::load(&config_path);

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--list" | "-l" => {
                list_devices()?;
                return Ok(());
            }
            "--version" | "-v" => {
                println!("echoscope {}", echoscope::VERSION);
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--device" | "-d" => {
                if i + 1 >= args.len() {
                    bail!("--device requires a device name");
                }
                config.device = Some(args[i + 1].clone());
                i += 2;
                continue;
            }
            "--sample-rate" | "-r" => {
                if i + 1 >= args.len() {
                    bail!("--sample-rate requires a value");
                }
                match args[i + 1].parse() {
                    Ok(rate) => config.sample_rate = rate,
                    Err(_) => bail!("invalid sample rate: {}", args[i + 1]),
                }
                i += 2;
                continue;
            }
            "--echo-seconds" | "-e" => {
                if i + 1 >= args.len() {
                    bail!("--echo-seconds requires a value");
                }
                match args[i + 1].parse() {
                    Ok(seconds) => config.echo_seconds = seconds,
                    Err(_) => bail!("invalid echo time: {}", args[i + 1]),
                }
                i += 2;
                continue;
            }
            "--taps" | "-t" => {
                if i + 1 >= args.len() {
                    bail!("--taps requires a value");
                }
                match args[i + 1].parse() {
                    Ok(taps) => config.echo_taps = taps,
                    Err(_) => bail!("invalid tap count: {}", args[i + 1]),
                }
                i += 2;
                continue;
            }
            arg => {
                print_help();
                bail!("unknown argument: {}", arg);
            }
        }
    }

    run(config, &config_path)
}

fn print_help() {
    println!("Usage: echoscope [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -l, --list               List available output devices");
    println!("  -d, --device NAME        Output device to use (default: host default)");
    println!("  -r, --sample-rate RATE   Sample rate in Hz (default: 48000)");
    println!("  -e, --echo-seconds SECS  Echo cycle duration (default: 0.25)");
    println!("  -t, --taps COUNT         Echo repeats (default: 3)");
    println!("  -v, --version            Show version");
    println!("  -h, --help               Show this help");
    println!();
    println!("Examples:");
    println!("  echoscope -d \"USB Audio\" -r 48000 -e 0.5 -t 4");
    println!("  echoscope --list");
}

fn list_devices() -> Result<()> {
    println!("Scanning for output devices...");
    println!();

    match AudioEngine::list_devices() {
        Ok(devices) => {
            println!("Found {} device(s):", devices.len());
            println!();
            for (i, device) in devices.iter().enumerate() {
                let default_marker = if device.is_default { " [DEFAULT]" } else { "" };
                println!("  {}. {}{}", i + 1, device.name, default_marker);
                println!("     Channels: {} out", device.output_channels);
                if !device.sample_rates.is_empty() {
                    println!("     Sample rates: {:?}", device.sample_rates);
                }
                println!();
            }
        }
        Err(e) => {
            error!("Failed to list devices: {}", e);
            println!("Error: {}", e);
        }
    }

    Ok(())
}

fn run(config: AppConfig, config_path: &std::path::Path) -> Result<()> {
    let mut engine = AudioEngine::new();
    engine.set_sample_rate(config.sample_rate);
    engine.set_echo_params(config.echo_params());

    match config.device {
        Some(ref name) => {
            if let Err(e) = engine.select_device(name) {
                error!("Failed to select device: {}", e);
                println!("Could not find device '{}'.", name);
                println!("Use --list to see available devices.");
                return Err(e);
            }
        }
        None => {
            if let Err(e) = engine.select_default_device() {
                error!("Failed to select default device: {}", e);
                return Err(e);
            }
        }
    }

    println!(
        "Device: {}",
        engine.device_name().unwrap_or("unknown")
    );

    // Consumers attach to the queue before the producer starts, and the
    // engine owns the queue for the whole session, so block memory
    // outlives both threads by construction.
    let reader = ScopeReader::new(engine.scope_queue());

    if let Err(e) = engine.start() {
        error!("Failed to start engine: {}", e);
        return Err(e);
    }

    let params = engine.echo_params();
    info!(
        echo_seconds = params.echo_seconds,
        taps = params.tap_count,
        level = params.level,
        "Echo running"
    );

    // Remember a working setup for next time.
    if let Err(e) = config.save(config_path) {
        tracing::warn!(error = %e, "Could not save config");
    }

    let mut monitor = ScopeMonitor::new(DEFAULT_FRAME_RATE).start(reader);

    println!("Rendering. Press Ctrl+C to stop.");
    println!();

    // Set up Ctrl+C handler
    let running = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, std::sync::atomic::Ordering::SeqCst);
    })
    .ok();

    let mut last_status = String::new();
    while running.load(std::sync::atomic::Ordering::SeqCst) {
        let status_line = format!(
            "Rendered: {:>10} samples | Scope frames: {:>6}",
            engine.samples_rendered(),
            monitor.frames_received()
        );
        if status_line != last_status {
            println!("{}", status_line);
            last_status = status_line;
        }

        std::thread::sleep(Duration::from_millis(500));
    }

    println!();
    println!("Stopping...");

    // Consumer first, then the producer, then everything drops.
    monitor.stop();
    engine.stop()?;

    println!("Done.");
    Ok(())
}
