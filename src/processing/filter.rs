// SPDX-License-Identifier: GPL-3.0-only

//! Filter bank
//!
//! Runs, in order: the selected color filter, the numeric adjustment
//! pipeline, and the optional timestamp overlay. The color transforms
//! are total functions over the pixel data; anything that can fail
//! degrades inside the adjustment pipeline instead of propagating.

use super::adjust::apply_adjustments;
use super::colorspace::{hsv_to_rgb, jet_colormap, luminance, rgb_to_hsv};
use super::overlay;
use crate::frame::Frame;
use crate::settings::{FilterKind, Settings};
use chrono::Local;

/// Fixed sepia color-mixing matrix (rows produce R, G, B)
const SEPIA: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Hue override for the ultraviolet look, in degrees (violet)
const UV_HUE: f32 = 240.0;

/// Transform one frame according to the settings snapshot: color
/// filter, then adjustments, then the timestamp overlay when enabled.
pub fn apply_filters(frame: &Frame, settings: &Settings) -> Frame {
    let filtered = color_filter(frame, settings.filter);
    let mut out = apply_adjustments(&filtered, settings);

    if settings.overlay_timestamp {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        overlay::draw_text(&mut out, &stamp);
    }

    out
}

fn color_filter(frame: &Frame, filter: FilterKind) -> Frame {
    match filter {
        FilterKind::None => frame.clone(),
        FilterKind::Grayscale => map_pixels(frame, |r, g, b| {
            let gray = luma_u8(r, g, b);
            [gray, gray, gray]
        }),
        FilterKind::Sepia => map_pixels(frame, |r, g, b| {
            let rgb = [r as f32, g as f32, b as f32];
            let mut out = [0u8; 3];
            for (channel, row) in out.iter_mut().zip(SEPIA.iter()) {
                let mixed = row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2];
                *channel = mixed.clamp(0.0, 255.0) as u8;
            }
            out
        }),
        FilterKind::Red => map_pixels(frame, |r, _g, _b| [r, 0, 0]),
        FilterKind::Green => map_pixels(frame, |_r, g, _b| [0, g, 0]),
        FilterKind::Blue => map_pixels(frame, |_r, _g, b| [0, 0, b]),
        FilterKind::Ir => map_pixels(frame, |r, g, b| {
            // False color: luminance through a heat colormap
            let gray = luma_u8(r, g, b) as f32 / 255.0;
            let (cr, cg, cb) = jet_colormap(gray);
            [to_u8(cr), to_u8(cg), to_u8(cb)]
        }),
        FilterKind::Uv => map_pixels(frame, |r, g, b| {
            // Fixed hue at full saturation, brightness preserved
            let (_, _, v) = rgb_to_hsv(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
            let (ur, ug, ub) = hsv_to_rgb(UV_HUE, 1.0, v);
            [to_u8(ur), to_u8(ug), to_u8(ub)]
        }),
    }
}

fn map_pixels(frame: &Frame, f: impl Fn(u8, u8, u8) -> [u8; 3]) -> Frame {
    let mut out = frame.clone();
    for rgb in out.data_mut().chunks_exact_mut(3) {
        let mapped = f(rgb[0], rgb[1], rgb[2]);
        rgb.copy_from_slice(&mapped);
    }
    out
}

#[inline]
fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    to_u8(luminance(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
    ))
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
