// SPDX-License-Identifier: GPL-3.0-only

//! Output directory management and timestamped file naming
//!
//! All captured files land under one base directory using the pattern
//! `<prefix><name>_<YYYYMMDD_HHMMSS>[_<index>].<ext>`.

use crate::constants::{STILL_EXTENSION, VIDEO_EXTENSION};
use chrono::Local;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where and how captured files are named
#[derive(Debug, Clone)]
pub struct OutputLayout {
    dir: PathBuf,
    prefix: String,
}

impl OutputLayout {
    /// Create the layout, making sure the base directory exists.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Point the layout at a different base directory, creating it if
    /// absent.
    pub fn retarget(&mut self, dir: impl Into<PathBuf>) -> io::Result<()> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        info!(dir = %dir.display(), "Output directory changed");
        self.dir = dir;
        Ok(())
    }

    /// Path for a still photo: `<prefix><name>_<timestamp>.jpg`
    pub fn still_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!(
            "{}{}_{}.{}",
            self.prefix,
            name,
            timestamp(),
            STILL_EXTENSION
        ))
    }

    /// Path for a video recording: `<prefix><name>_<timestamp>.avi`
    pub fn video_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!(
            "{}{}_{}.{}",
            self.prefix,
            name,
            timestamp(),
            VIDEO_EXTENSION
        ))
    }

    /// Path for one timelapse frame:
    /// `<prefix><name>_<timestamp>_<index>.jpg`
    pub fn sequence_path(&self, name: &str, index: u32) -> PathBuf {
        self.dir.join(format!(
            "{}{}_{}_{}.{}",
            self.prefix,
            name,
            timestamp(),
            index,
            STILL_EXTENSION
        ))
    }
}

fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}
