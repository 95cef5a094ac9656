// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "camstream")]
#[command(about = "Webcam capture: stream, photo, video, timelapse")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Take a photo
    Photo {
        /// Camera index to use (from 'camstream list')
        #[arg(short, long, default_value = "0")]
        camera: u32,

        /// Filename stem for the output
        #[arg(short, long, default_value = "photo")]
        name: String,

        /// Output directory (default: captures/)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Record a video
    Video {
        /// Camera index to use
        #[arg(short, long, default_value = "0")]
        camera: u32,

        /// Filename stem for the output
        #[arg(short, long, default_value = "video")]
        name: String,

        /// Recording duration in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,

        /// Output directory (default: captures/)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Capture a timelapse sequence
    Timelapse {
        /// Camera index to use
        #[arg(short, long, default_value = "0")]
        camera: u32,

        /// Filename stem for the frames
        #[arg(short, long, default_value = "timelapse")]
        name: String,

        /// Seconds between frames
        #[arg(short, long, default_value = "1")]
        interval: u64,

        /// Total run time in seconds
        #[arg(short, long, default_value = "60")]
        duration: u64,

        /// Output directory (default: captures/)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Dump multipart MJPEG stream chunks to a file or stdout
    Stream {
        /// Camera index to use
        #[arg(short, long, default_value = "0")]
        camera: u32,

        /// Number of frames to pull
        #[arg(short, long, default_value = "100")]
        frames: u32,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=camstream=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => cli::list_devices(),
        Commands::Photo {
            camera,
            name,
            output_dir,
        } => cli::take_photo(camera, &name, output_dir),
        Commands::Video {
            camera,
            name,
            duration,
            output_dir,
        } => cli::record_video(camera, &name, duration, output_dir),
        Commands::Timelapse {
            camera,
            name,
            interval,
            duration,
            output_dir,
        } => cli::run_timelapse(camera, &name, interval, duration, output_dir),
        Commands::Stream {
            camera,
            frames,
            output,
        } => cli::dump_stream(camera, frames, output),
    }
}
