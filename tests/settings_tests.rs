// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the settings surface

use camstream::{FilterKind, Settings, SettingsPatch};
use std::collections::HashMap;

fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_defaults_are_neutral() {
    let settings = Settings::default();
    assert_eq!(settings.brightness, 0);
    assert_eq!(settings.contrast, 0);
    assert_eq!(settings.saturation, 0);
    assert_eq!(settings.sharpness, 0);
    assert_eq!(settings.exposure, 0.0);
    assert_eq!(settings.filter, FilterKind::None);
    assert!(!settings.overlay_timestamp);
}

#[test]
fn test_string_map_update_end_to_end() {
    let mut settings = Settings::default();
    let patch = SettingsPatch::from_map(&map(&[
        ("brightness", "15"),
        ("exposure", "2.5"),
        ("resolution", "1920,1080"),
        ("filter", "grayscale"),
    ]))
    .unwrap();

    settings.apply(&patch).unwrap();
    assert_eq!(settings.brightness, 15);
    assert_eq!(settings.exposure, 2.5);
    assert_eq!(settings.resolution, (1920, 1080));
    assert_eq!(settings.filter, FilterKind::Grayscale);
    // Untouched fields keep their values
    assert_eq!(settings.contrast, 0);
}

#[test]
fn test_json_update_end_to_end() {
    let mut settings = Settings::default();
    let patch =
        SettingsPatch::from_json(r#"{"sharpness": -40, "overlay_timestamp": true}"#).unwrap();
    settings.apply(&patch).unwrap();
    assert_eq!(settings.sharpness, -40);
    assert!(settings.overlay_timestamp);
}

#[test]
fn test_bad_field_rejects_whole_patch() {
    let mut settings = Settings::default();
    let patch = SettingsPatch::from_map(&map(&[
        ("brightness", "30"),
        ("saturation", "-200"), // out of domain
    ]))
    .unwrap();

    let err = settings.apply(&patch).unwrap_err();
    assert_eq!(err.field, "saturation");
    // Nothing merged
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_unparseable_field_fails_at_parse() {
    assert!(SettingsPatch::from_map(&map(&[("exposure", "bright")])).is_err());
    assert!(SettingsPatch::from_json(r#"{"no_such_field": 1}"#).is_err());
}
