// SPDX-License-Identifier: GPL-3.0-only

//! Runtime configuration for the capture core

use crate::constants::DEFAULT_PROBE_LIMIT;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base directory for captured files (created if absent)
    pub save_dir: PathBuf,
    /// Prefix prepended to every output filename
    pub filename_prefix: String,
    /// Highest device index probed by enumeration
    pub probe_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("captures"),
            filename_prefix: "capture_".to_string(),
            probe_limit: DEFAULT_PROBE_LIMIT,
        }
    }
}
