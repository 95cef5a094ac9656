// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Resolution requested from a newly opened device; the driver may
/// negotiate down to the closest supported mode.
pub const REQUEST_WIDTH: u32 = 1920;
pub const REQUEST_HEIGHT: u32 = 1080;

/// Number of mmap buffers for the capture stream
pub const CAPTURE_BUFFERS: u32 = 4;

/// Highest device index probed during enumeration
pub const DEFAULT_PROBE_LIMIT: u32 = 10;

/// Streamed frames are downscaled to fit within this size
pub const MAX_STREAM_WIDTH: u32 = 1280;
pub const MAX_STREAM_HEIGHT: u32 = 720;

/// JPEG quality for streamed frames
pub const STREAM_JPEG_QUALITY: u8 = 85;

/// JPEG quality for saved stills (photo and timelapse frames)
pub const STILL_JPEG_QUALITY: u8 = 95;

/// Multipart boundary marker for the MJPEG stream
pub const STREAM_BOUNDARY: &str = "frame";

/// Wait between stream iterations while no device is open,
/// and after a read with no fallback frame
pub const STREAM_IDLE_WAIT: Duration = Duration::from_millis(100);

/// Pacing delay after each streamed frame; bounds CPU and bandwidth
pub const STREAM_PACING: Duration = Duration::from_millis(10);

/// Declared frame rate of recorded video files
pub const RECORD_FPS: u32 = 20;

/// Cadence of the recording loop (~20 Hz)
pub const RECORD_TICK: Duration = Duration::from_millis(50);

/// Container extension for recorded video files
pub const VIDEO_EXTENSION: &str = "avi";

/// Extension for saved stills
pub const STILL_EXTENSION: &str = "jpg";
