// SPDX-License-Identifier: GPL-3.0-only

//! Photo and video output pipelines

pub mod photo;
pub mod video;

pub use video::{GstAviSink, RecordingSink};
