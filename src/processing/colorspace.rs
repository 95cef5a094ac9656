// SPDX-License-Identifier: GPL-3.0-only

//! Color space helpers for the CPU filter path

/// RGB ([0,1] each) to HSV (hue in degrees [0,360), s/v in [0,1])
#[inline]
pub fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta <= f32::EPSILON {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let saturation = if max <= f32::EPSILON { 0.0 } else { delta / max };

    (hue, saturation, max)
}

/// HSV (hue in degrees, s/v in [0,1]) to RGB in [0,1]
#[inline]
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let h = h.rem_euclid(360.0);
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (r + m, g + m, b + m)
}

/// Luminance of an RGB triple in [0,1] (BT.601 weights)
#[inline]
pub fn luminance(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Jet-style heat colormap: 0.0 maps to deep blue, 1.0 to deep red.
#[inline]
pub fn jet_colormap(value: f32) -> (f32, f32, f32) {
    let v = value.clamp(0.0, 1.0);
    let r = (1.5 - (4.0 * v - 3.0).abs()).clamp(0.0, 1.0);
    let g = (1.5 - (4.0 * v - 2.0).abs()).clamp(0.0, 1.0);
    let b = (1.5 - (4.0 * v - 1.0).abs()).clamp(0.0, 1.0);
    (r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_hsv_round_trip() {
        for &(r, g, b) in &[
            (1.0, 0.0, 0.0),
            (0.0, 1.0, 0.0),
            (0.0, 0.0, 1.0),
            (0.5, 0.5, 0.5),
            (0.8, 0.3, 0.1),
        ] {
            let (h, s, v) = rgb_to_hsv(r, g, b);
            let (r2, g2, b2) = hsv_to_rgb(h, s, v);
            assert!(close(r, r2) && close(g, g2) && close(b, b2), "({r},{g},{b})");
        }
    }

    #[test]
    fn test_primary_hues() {
        assert!(close(rgb_to_hsv(1.0, 0.0, 0.0).0, 0.0));
        assert!(close(rgb_to_hsv(0.0, 1.0, 0.0).0, 120.0));
        assert!(close(rgb_to_hsv(0.0, 0.0, 1.0).0, 240.0));
    }

    #[test]
    fn test_gray_has_no_saturation() {
        let (_, s, v) = rgb_to_hsv(0.5, 0.5, 0.5);
        assert!(close(s, 0.0));
        assert!(close(v, 0.5));
    }

    #[test]
    fn test_jet_endpoints() {
        let (r, _, b) = jet_colormap(0.0);
        assert!(close(r, 0.0) && b > 0.4);
        let (r, _, b) = jet_colormap(1.0);
        assert!(r > 0.4 && close(b, 0.0));
        let (_, g, _) = jet_colormap(0.5);
        assert!(close(g, 1.0));
    }
}
