// SPDX-License-Identifier: GPL-3.0-only

//! Ordered numeric adjustment pipeline
//!
//! Stages run in a fixed order over samples normalized to [0,1]:
//! brightness -> contrast -> saturation -> sharpness -> exposure ->
//! clamp -> rescale. Each stage sees the previous stage's output, so
//! the order is part of the contract. A stage that cannot run degrades
//! to the unmodified input frame; the capture loops never stop on a
//! bad transform.

use super::colorspace::{hsv_to_rgb, rgb_to_hsv};
use crate::frame::Frame;
use crate::settings::Settings;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

static FALLBACKS: AtomicU64 = AtomicU64::new(0);

/// Number of frames returned unmodified because an adjustment stage
/// failed.
pub fn fallback_count() -> u64 {
    FALLBACKS.load(Ordering::Relaxed)
}

/// Apply the numeric adjustments from `settings` to `frame`.
pub fn apply_adjustments(frame: &Frame, settings: &Settings) -> Frame {
    match adjusted(frame, settings) {
        Some(out) => out,
        None => {
            FALLBACKS.fetch_add(1, Ordering::Relaxed);
            warn!(
                width = frame.width(),
                height = frame.height(),
                "Adjustment pipeline degraded to passthrough"
            );
            frame.clone()
        }
    }
}

fn adjusted(frame: &Frame, settings: &Settings) -> Option<Frame> {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    if frame.data().len() != width * height * 3 {
        return None;
    }

    // Normalize to [0,1]
    let mut px: Vec<f32> = frame.data().iter().map(|&b| b as f32 / 255.0).collect();

    // Brightness: channel-uniform additive shift
    if settings.brightness != 0 {
        let shift = settings.brightness as f32 / 100.0;
        for v in &mut px {
            *v += shift;
        }
    }

    // Contrast about the 0.5 midpoint
    if settings.contrast != 0 {
        let factor = 1.0 + settings.contrast as f32 / 100.0;
        for v in &mut px {
            *v = (*v - 0.5) * factor + 0.5;
        }
    }

    // Saturation scale in HSV
    if settings.saturation != 0 {
        let factor = 1.0 + settings.saturation as f32 / 100.0;
        for rgb in px.chunks_exact_mut(3) {
            let (h, s, v) = rgb_to_hsv(rgb[0], rgb[1], rgb[2]);
            let (r, g, b) = hsv_to_rgb(h, (s * factor).clamp(0.0, 1.0), v);
            rgb[0] = r;
            rgb[1] = g;
            rgb[2] = b;
        }
    }

    // Sharpness: 3x3 kernel, center 9 + sharpness/20, neighbors -1.
    // Negative values soften, positive sharpen past the unity kernel.
    if settings.sharpness != 0 {
        let center = 9.0 + settings.sharpness as f32 / 20.0;
        px = convolve_3x3(&px, width, height, center);
    }

    // Exposure multiplier
    if settings.exposure != 0.0 {
        let factor = 1.0 + settings.exposure as f32 / 10.0;
        for v in &mut px {
            *v *= factor;
        }
    }

    // Clamp and rescale to u8
    let data: Vec<u8> = px
        .iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();

    Frame::from_rgb(frame.width(), frame.height(), data)
}

/// Convolve every channel with the sharpening kernel, replicating edge
/// samples at the borders.
fn convolve_3x3(px: &[f32], width: usize, height: usize, center: f32) -> Vec<f32> {
    let mut out = vec![0.0f32; px.len()];

    for y in 0..height {
        for x in 0..width {
            for c in 0..3 {
                let mut acc = 0.0f32;
                for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        let sx = (x as i64 + dx).clamp(0, width as i64 - 1) as usize;
                        let sy = (y as i64 + dy).clamp(0, height as i64 - 1) as usize;
                        let weight = if dx == 0 && dy == 0 { center } else { -1.0 };
                        acc += weight * px[(sy * width + sx) * 3 + c];
                    }
                }
                out[(y * width + x) * 3 + c] = acc;
            }
        }
    }

    out
}
