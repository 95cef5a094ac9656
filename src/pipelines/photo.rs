// SPDX-License-Identifier: GPL-3.0-only

//! Still-image encoding and saving

use crate::constants::{MAX_STREAM_HEIGHT, MAX_STREAM_WIDTH};
use crate::errors::CaptureError;
use crate::frame::Frame;
use image::codecs::jpeg::JpegEncoder;
use std::path::Path;
use tracing::info;

/// Encode a frame as JPEG at the given quality (0-100).
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, CaptureError> {
    let img = frame
        .to_rgb_image()
        .ok_or_else(|| CaptureError::Encoding("frame buffer size mismatch".to_string()))?;

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    img.write_with_encoder(encoder)
        .map_err(|e| CaptureError::Encoding(e.to_string()))?;

    Ok(out)
}

/// Encode a frame and write it to `path`.
pub fn save_jpeg(frame: &Frame, path: &Path, quality: u8) -> Result<(), CaptureError> {
    let bytes = encode_jpeg(frame, quality)?;
    std::fs::write(path, bytes).map_err(|e| CaptureError::Save(e.to_string()))?;

    info!(
        path = %path.display(),
        width = frame.width(),
        height = frame.height(),
        "Saved still image"
    );
    Ok(())
}

/// Shrink a frame so it fits the streaming size cap. Frames already
/// within the cap pass through; larger ones get a straight resize to
/// the cap (aspect ratio is not preserved, matching the stream
/// contract).
pub fn downscale_for_stream(frame: &Frame) -> Frame {
    if frame.width() <= MAX_STREAM_WIDTH && frame.height() <= MAX_STREAM_HEIGHT {
        return frame.clone();
    }
    frame.resized(MAX_STREAM_WIDTH, MAX_STREAM_HEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_produces_jpeg() {
        let frame = Frame::filled(16, 16, [90, 120, 30]);
        let bytes = encode_jpeg(&frame, 85).unwrap();
        // JPEG SOI marker
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        // ... and EOI at the end
        assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        let frame = Frame::filled(8, 8, [200, 50, 50]);

        save_jpeg(&frame, &path, 95).unwrap();

        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (8, 8));
    }

    #[test]
    fn test_downscale_only_when_needed() {
        let small = Frame::filled(640, 480, [0, 0, 0]);
        let out = downscale_for_stream(&small);
        assert_eq!((out.width(), out.height()), (640, 480));

        let large = Frame::filled(1920, 1080, [0, 0, 0]);
        let out = downscale_for_stream(&large);
        assert_eq!(
            (out.width(), out.height()),
            (MAX_STREAM_WIDTH, MAX_STREAM_HEIGHT)
        );
    }
}
