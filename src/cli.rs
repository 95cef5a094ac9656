// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands over the session controller
//!
//! These commands stand where the web transport would: each builds a
//! controller, drives one operation, and tears the session down.

use camstream::session::{TimelapseStart, VideoStart};
use camstream::{Config, SessionController};
use futures::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

fn build_controller(
    output_dir: Option<PathBuf>,
) -> Result<SessionController, Box<dyn std::error::Error>> {
    let mut config = Config::default();
    if let Some(dir) = output_dir {
        config.save_dir = dir;
    }
    Ok(SessionController::new(config)?)
}

/// List available capture devices
pub fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
    let controller = build_controller(None)?;
    let devices = controller.list_devices();

    if devices.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    for index in devices {
        println!("  [{}] Camera {}", index, index);
    }
    Ok(())
}

/// Capture a single photo
pub fn take_photo(
    device: u32,
    name: &str,
    output_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = build_controller(output_dir)?;
    let (width, height) = controller.select_device(device)?;
    println!("Using camera {} at {}x{}", device, width, height);

    let path = controller.capture_photo(name)?;
    println!("Photo saved: {}", path.display());

    controller.teardown();
    Ok(())
}

/// Record a video for `duration` seconds
pub fn record_video(
    device: u32,
    name: &str,
    duration: u64,
    output_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = build_controller(output_dir)?;
    controller.select_device(device)?;

    match controller.start_video(name)? {
        VideoStart::Started(path) => println!("Recording to {}", path.display()),
        VideoStart::AlreadyRecording => return Err("recording already in progress".into()),
    }

    install_interrupt_teardown(&controller);
    std::thread::sleep(Duration::from_secs(duration));

    controller.stop_video();
    controller.teardown();
    println!("Recording finished.");
    Ok(())
}

/// Run a timelapse and wait for it to complete
pub fn run_timelapse(
    device: u32,
    name: &str,
    interval: u64,
    duration: u64,
    output_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = build_controller(output_dir)?;
    controller.select_device(device)?;

    let outcome = controller.start_timelapse(
        name,
        Duration::from_secs(interval),
        Duration::from_secs(duration),
    );
    match outcome {
        TimelapseStart::Started => {
            println!("Timelapse running: {}s every {}s", duration, interval)
        }
        TimelapseStart::AlreadyRunning => return Err("timelapse already in progress".into()),
    }

    install_interrupt_teardown(&controller);
    while controller.is_timelapse_active() {
        std::thread::sleep(Duration::from_millis(200));
    }

    controller.teardown();
    println!("Timelapse finished.");
    Ok(())
}

/// Pull `frames` multipart chunks from the stream and write them to a
/// file (or stdout for "-")
pub fn dump_stream(
    device: u32,
    frames: u32,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = build_controller(None)?;
    controller.select_device(device)?;
    install_interrupt_teardown(&controller);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let mut stream = Box::pin(controller.stream_frames());

        let mut sink: Box<dyn Write> = match &output {
            Some(path) => Box::new(std::fs::File::create(path)?),
            None => Box::new(std::io::stdout().lock()),
        };

        for _ in 0..frames {
            let Some(chunk) = stream.next().await else {
                break;
            };
            sink.write_all(&chunk)?;
        }
        sink.flush()?;
        Ok::<_, std::io::Error>(())
    })?;

    controller.teardown();
    if let Some(path) = output {
        println!("Wrote {} frames to {}", frames, path.display());
    }
    Ok(())
}

/// Tear the session down on Ctrl-C so the device and any open encoder
/// are released before the process exits.
fn install_interrupt_teardown(controller: &SessionController) {
    let controller = controller.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        controller.teardown();
        std::process::exit(130);
    }) {
        tracing::warn!(error = %e, "Could not install Ctrl-C handler");
    }
}
