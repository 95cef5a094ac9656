// SPDX-License-Identifier: GPL-3.0-only

//! Pixel format conversion to tightly packed RGB24
//!
//! Capture devices deliver frames in whatever format was negotiated;
//! everything downstream works on RGB24, so each supported format gets
//! one converter here.

use crate::frame::Frame;

/// Copy an RGB3 buffer into a tightly packed frame, dropping per-line
/// padding when the stride exceeds `width * 3`.
pub fn rgb3_to_frame(data: &[u8], width: u32, height: u32, stride: u32) -> Option<Frame> {
    let width = width as usize;
    let height = height as usize;
    let stride = stride.max(width as u32 * 3) as usize;
    if data.len() < stride * height.saturating_sub(1) + width * 3 {
        return None;
    }

    let mut rgb = Vec::with_capacity(width * height * 3);
    for row in 0..height {
        let start = row * stride;
        rgb.extend_from_slice(&data[start..start + width * 3]);
    }
    Frame::from_rgb(width as u32, height as u32, rgb)
}

/// Convert a YUYV (YUV 4:2:2 packed) buffer to RGB24.
pub fn yuyv_to_frame(data: &[u8], width: u32, height: u32, stride: u32) -> Option<Frame> {
    let width = width as usize;
    let height = height as usize;
    let stride = stride.max(width as u32 * 2) as usize;
    if width % 2 != 0 || data.len() < stride * height.saturating_sub(1) + width * 2 {
        return None;
    }

    let mut rgb = Vec::with_capacity(width * height * 3);
    for row in 0..height {
        let line = &data[row * stride..row * stride + width * 2];
        // YUYV: [Y0 U Y1 V] covers two pixels sharing one chroma pair
        for quad in line.chunks_exact(4) {
            let u = quad[1];
            let v = quad[3];
            for &y in &[quad[0], quad[2]] {
                let (r, g, b) = yuv_to_rgb(y, u, v);
                rgb.push(r);
                rgb.push(g);
                rgb.push(b);
            }
        }
    }
    Frame::from_rgb(width as u32, height as u32, rgb)
}

/// Decode an MJPG buffer (one JPEG image per frame) to RGB24.
pub fn mjpg_to_frame(data: &[u8]) -> Option<Frame> {
    let img = image::load_from_memory(data).ok()?;
    Some(Frame::from(img.to_rgb8()))
}

/// YUV to RGB conversion (BT.601, full-range chroma offset)
#[inline]
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = y + 1.402 * v;
    let g = y - 0.344 * u - 0.714 * v;
    let b = y + 1.772 * u;

    (clamp_u8(r), clamp_u8(g), clamp_u8(b))
}

#[inline]
fn clamp_u8(value: f32) -> u8 {
    value.clamp(0.0, 255.0) as u8
}
