// SPDX-License-Identifier: GPL-3.0-only

//! Image settings record and partial updates
//!
//! `Settings` is the live record owned by the session controller.
//! Updates arrive as a `SettingsPatch`, a typed partial record parsed
//! from JSON or a string map. The whole patch is validated before
//! any field of the live record is touched, so a bad field can never
//! leave the record half-merged.

use crate::errors::SettingsError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Named color/style transform applied ahead of the adjustment pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    #[default]
    None,
    Grayscale,
    Sepia,
    Red,
    Green,
    Blue,
    /// False-color infrared look (grayscale through a heat colormap)
    Ir,
    /// Fixed-hue ultraviolet look
    Uv,
}

impl FilterKind {
    pub const ALL: [FilterKind; 8] = [
        FilterKind::None,
        FilterKind::Grayscale,
        FilterKind::Sepia,
        FilterKind::Red,
        FilterKind::Green,
        FilterKind::Blue,
        FilterKind::Ir,
        FilterKind::Uv,
    ];

    /// Parse a filter name as used by settings updates.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "none" => Some(FilterKind::None),
            "grayscale" => Some(FilterKind::Grayscale),
            "sepia" => Some(FilterKind::Sepia),
            "red" => Some(FilterKind::Red),
            "green" => Some(FilterKind::Green),
            "blue" => Some(FilterKind::Blue),
            "ir" => Some(FilterKind::Ir),
            "uv" => Some(FilterKind::Uv),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::None => "none",
            FilterKind::Grayscale => "grayscale",
            FilterKind::Sepia => "sepia",
            FilterKind::Red => "red",
            FilterKind::Green => "green",
            FilterKind::Blue => "blue",
            FilterKind::Ir => "ir",
            FilterKind::Uv => "uv",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Live image settings.
///
/// A single frame transform always works on a cloned snapshot of this
/// record, taken under the settings lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Additive brightness, [-100, 100]
    pub brightness: i32,
    /// Contrast about the midpoint, [-100, 100]
    pub contrast: i32,
    /// Saturation scale, [-100, 100]
    pub saturation: i32,
    /// Sharpening kernel strength, [-100, 100]
    pub sharpness: i32,
    /// Exposure multiplier, [-10, 10]
    pub exposure: f64,
    /// Capture resolution (width, height); set from the negotiated
    /// device format on select, used for the video encoder
    pub resolution: (u32, u32),
    /// Selected color filter
    pub filter: FilterKind,
    /// Draw the wall-clock timestamp onto every frame
    pub overlay_timestamp: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            brightness: 0,
            contrast: 0,
            saturation: 0,
            sharpness: 0,
            exposure: 0.0,
            resolution: (1280, 720),
            filter: FilterKind::None,
            overlay_timestamp: false,
        }
    }
}

impl Settings {
    /// Validate the whole patch, then merge the provided fields.
    ///
    /// On error the record is left untouched.
    pub fn apply(&mut self, patch: &SettingsPatch) -> Result<(), SettingsError> {
        patch.validate()?;
        if let Some(v) = patch.brightness {
            self.brightness = v;
        }
        if let Some(v) = patch.contrast {
            self.contrast = v;
        }
        if let Some(v) = patch.saturation {
            self.saturation = v;
        }
        if let Some(v) = patch.sharpness {
            self.sharpness = v;
        }
        if let Some(v) = patch.exposure {
            self.exposure = v;
        }
        if let Some(v) = patch.resolution {
            self.resolution = v;
        }
        if let Some(v) = patch.filter {
            self.filter = v;
        }
        if let Some(v) = patch.overlay_timestamp {
            self.overlay_timestamp = v;
        }
        Ok(())
    }
}

/// Partial settings update; unset fields leave the record untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsPatch {
    pub brightness: Option<i32>,
    pub contrast: Option<i32>,
    pub saturation: Option<i32>,
    pub sharpness: Option<i32>,
    pub exposure: Option<f64>,
    pub resolution: Option<(u32, u32)>,
    pub filter: Option<FilterKind>,
    pub overlay_timestamp: Option<bool>,
}

impl SettingsPatch {
    /// Parse a patch from a string map, coercing each field:
    /// integers for the four percent settings, a real for exposure,
    /// `"width,height"` for resolution, a filter name, and a bool for
    /// the overlay flag.
    pub fn from_map(fields: &HashMap<String, String>) -> Result<Self, SettingsError> {
        let mut patch = SettingsPatch::default();
        for (key, value) in fields {
            match key.as_str() {
                "brightness" => patch.brightness = Some(parse_int("brightness", value)?),
                "contrast" => patch.contrast = Some(parse_int("contrast", value)?),
                "saturation" => patch.saturation = Some(parse_int("saturation", value)?),
                "sharpness" => patch.sharpness = Some(parse_int("sharpness", value)?),
                "exposure" => {
                    patch.exposure = Some(value.trim().parse::<f64>().map_err(|_| {
                        SettingsError::new("exposure", format!("'{}' is not a number", value))
                    })?);
                }
                "resolution" => patch.resolution = Some(parse_resolution(value)?),
                "filter" => {
                    patch.filter = Some(FilterKind::parse(value.trim()).ok_or_else(|| {
                        SettingsError::new("filter", format!("unknown filter '{}'", value))
                    })?);
                }
                "overlay_timestamp" => {
                    patch.overlay_timestamp =
                        Some(value.trim().parse::<bool>().map_err(|_| {
                            SettingsError::new(
                                "overlay_timestamp",
                                format!("'{}' is not a boolean", value),
                            )
                        })?);
                }
                _ => {
                    return Err(SettingsError::new("", format!("unknown field '{}'", key)));
                }
            }
        }
        Ok(patch)
    }

    /// Parse a patch from a JSON object.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(json).map_err(|e| SettingsError::new("", e.to_string()))
    }

    /// Check every provided field against its domain.
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_percent("brightness", self.brightness)?;
        check_percent("contrast", self.contrast)?;
        check_percent("saturation", self.saturation)?;
        check_percent("sharpness", self.sharpness)?;
        if let Some(exposure) = self.exposure {
            if !exposure.is_finite() || !(-10.0..=10.0).contains(&exposure) {
                return Err(SettingsError::new(
                    "exposure",
                    format!("{} is outside [-10, 10]", exposure),
                ));
            }
        }
        if let Some((width, height)) = self.resolution {
            if width == 0 || height == 0 {
                return Err(SettingsError::new(
                    "resolution",
                    "width and height must be positive",
                ));
            }
        }
        Ok(())
    }
}

fn parse_int(field: &'static str, value: &str) -> Result<i32, SettingsError> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|_| SettingsError::new(field, format!("'{}' is not an integer", value)))
}

fn parse_resolution(value: &str) -> Result<(u32, u32), SettingsError> {
    let mut parts = value.split(',');
    let (Some(w), Some(h), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(SettingsError::new(
            "resolution",
            format!("'{}' is not 'width,height'", value),
        ));
    };
    let width = w.trim().parse::<u32>().map_err(|_| {
        SettingsError::new("resolution", format!("'{}' is not an integer", w.trim()))
    })?;
    let height = h.trim().parse::<u32>().map_err(|_| {
        SettingsError::new("resolution", format!("'{}' is not an integer", h.trim()))
    })?;
    Ok((width, height))
}

fn check_percent(field: &'static str, value: Option<i32>) -> Result<(), SettingsError> {
    if let Some(v) = value {
        if !(-100..=100).contains(&v) {
            return Err(SettingsError::new(
                field,
                format!("{} is outside [-100, 100]", v),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_map_coerces_fields() {
        let patch = SettingsPatch::from_map(&map(&[
            ("brightness", "25"),
            ("exposure", "-1.5"),
            ("resolution", "640,480"),
            ("filter", "sepia"),
            ("overlay_timestamp", "true"),
        ]))
        .unwrap();

        assert_eq!(patch.brightness, Some(25));
        assert_eq!(patch.exposure, Some(-1.5));
        assert_eq!(patch.resolution, Some((640, 480)));
        assert_eq!(patch.filter, Some(FilterKind::Sepia));
        assert_eq!(patch.overlay_timestamp, Some(true));
        assert_eq!(patch.contrast, None);
    }

    #[test]
    fn test_from_map_rejects_bad_values() {
        assert!(SettingsPatch::from_map(&map(&[("brightness", "abc")])).is_err());
        assert!(SettingsPatch::from_map(&map(&[("resolution", "640")])).is_err());
        assert!(SettingsPatch::from_map(&map(&[("filter", "psychedelic")])).is_err());
        assert!(SettingsPatch::from_map(&map(&[("unknown", "1")])).is_err());
    }

    #[test]
    fn test_from_json() {
        let patch = SettingsPatch::from_json(r#"{"contrast": 40, "filter": "ir"}"#).unwrap();
        assert_eq!(patch.contrast, Some(40));
        assert_eq!(patch.filter, Some(FilterKind::Ir));
        assert!(SettingsPatch::from_json(r#"{"contrast": "forty"}"#).is_err());
    }

    #[test]
    fn test_apply_validates_before_merge() {
        let mut settings = Settings::default();
        let patch = SettingsPatch {
            brightness: Some(50),
            exposure: Some(99.0), // out of domain
            ..SettingsPatch::default()
        };

        assert!(settings.apply(&patch).is_err());
        // The valid field was not merged either
        assert_eq!(settings.brightness, 0);
    }

    #[test]
    fn test_apply_merges_only_provided_fields() {
        let mut settings = Settings::default();
        settings.contrast = 10;

        let patch = SettingsPatch {
            brightness: Some(-30),
            ..SettingsPatch::default()
        };
        settings.apply(&patch).unwrap();

        assert_eq!(settings.brightness, -30);
        assert_eq!(settings.contrast, 10);
    }

    #[test]
    fn test_domain_bounds() {
        let ok = SettingsPatch {
            brightness: Some(100),
            exposure: Some(-10.0),
            ..SettingsPatch::default()
        };
        assert!(ok.validate().is_ok());

        let bad = SettingsPatch {
            sharpness: Some(101),
            ..SettingsPatch::default()
        };
        assert!(bad.validate().is_err());

        let zero_res = SettingsPatch {
            resolution: Some((0, 480)),
            ..SettingsPatch::default()
        };
        assert!(zero_res.validate().is_err());
    }

    #[test]
    fn test_filter_parse_round_trip() {
        for filter in FilterKind::ALL {
            assert_eq!(FilterKind::parse(filter.name()), Some(filter));
        }
        assert_eq!(FilterKind::parse("invalid"), None);
    }
}
