// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 capture source
//!
//! Opens a device by index, negotiates the capture format, and reads
//! frames through a memory-mapped stream. The device is asked for
//! 1920x1080 and may silently negotiate a lower supported mode; the
//! actual format is what `resolution()` reports.

use super::format_converters::{mjpg_to_frame, rgb3_to_frame, yuyv_to_frame};
use super::CaptureSource;
use crate::constants::{CAPTURE_BUFFERS, REQUEST_HEIGHT, REQUEST_WIDTH};
use crate::errors::CameraError;
use crate::frame::Frame;
use tracing::{debug, info};
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

/// Pixel formats this source can decode, in preference order
const FOURCC_PREFERENCE: [&[u8; 4]; 3] = [b"RGB3", b"YUYV", b"MJPG"];

/// An open V4L2 capture device
pub struct V4l2Source {
    // Declared before `device` so the stream is torn down first
    stream: MmapStream<'static>,
    #[allow(dead_code)]
    device: Device,
    format: Format,
}

impl V4l2Source {
    /// Open the device at `/dev/video<index>` and negotiate a capture
    /// format.
    pub fn open(index: u32) -> Result<Self, CameraError> {
        let device = Device::new(index as usize)
            .map_err(|e| CameraError::Unavailable(format!("device {}: {}", index, e)))?;

        let caps = device
            .query_caps()
            .map_err(|e| CameraError::Unavailable(format!("device {}: {}", index, e)))?;
        if !caps
            .capabilities
            .contains(v4l::capability::Flags::VIDEO_CAPTURE)
        {
            return Err(CameraError::Unavailable(format!(
                "device {} ({}) cannot capture video",
                index, caps.card
            )));
        }

        let format = negotiate_format(&device, index)?;
        let stream = MmapStream::with_buffers(&device, Type::VideoCapture, CAPTURE_BUFFERS)
            .map_err(|e| CameraError::Unavailable(format!("device {}: {}", index, e)))?;

        info!(
            index,
            card = %caps.card,
            width = format.width,
            height = format.height,
            fourcc = %format.fourcc,
            "Opened capture device"
        );

        Ok(Self {
            stream,
            device,
            format,
        })
    }
}

impl CaptureSource for V4l2Source {
    fn resolution(&self) -> (u32, u32) {
        (self.format.width, self.format.height)
    }

    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        let (buf, meta) = self
            .stream
            .next()
            .map_err(|e| CameraError::ReadFailed(e.to_string()))?;

        let used = meta.bytesused as usize;
        let data = if used > 0 && used <= buf.len() {
            &buf[..used]
        } else {
            buf
        };

        let frame = match &self.format.fourcc.repr {
            b"RGB3" => rgb3_to_frame(data, self.format.width, self.format.height, self.format.stride),
            b"YUYV" => yuyv_to_frame(data, self.format.width, self.format.height, self.format.stride),
            b"MJPG" => mjpg_to_frame(data),
            other => {
                return Err(CameraError::ReadFailed(format!(
                    "unsupported pixel format {:?}",
                    FourCC::new(other)
                )));
            }
        };

        frame.ok_or_else(|| {
            CameraError::ReadFailed(format!(
                "short or undecodable {} buffer ({} bytes)",
                self.format.fourcc, used
            ))
        })
    }
}

/// Try each supported fourcc at the requested resolution and keep the
/// first one the driver accepts.
fn negotiate_format(device: &Device, index: u32) -> Result<Format, CameraError> {
    for fourcc in FOURCC_PREFERENCE {
        let requested = Format::new(REQUEST_WIDTH, REQUEST_HEIGHT, FourCC::new(fourcc));
        match device.set_format(&requested) {
            Ok(actual) if actual.fourcc == requested.fourcc => {
                debug!(
                    index,
                    fourcc = %actual.fourcc,
                    width = actual.width,
                    height = actual.height,
                    "Negotiated capture format"
                );
                return Ok(actual);
            }
            Ok(actual) => {
                debug!(index, requested = %requested.fourcc, got = %actual.fourcc, "Driver substituted pixel format");
            }
            Err(e) => {
                debug!(index, fourcc = %requested.fourcc, error = %e, "Format rejected");
            }
        }
    }

    Err(CameraError::Unavailable(format!(
        "device {} offers no supported pixel format",
        index
    )))
}
