// SPDX-License-Identifier: GPL-3.0-only

//! Device enumeration by sequential probing

use super::v4l2::V4l2Source;
use super::CaptureSource;
use tracing::debug;

/// Probe device indices `0..limit` and report the usable ones.
///
/// An index counts as available when it opens and yields at least one
/// readable frame; every probed device is released right after the
/// probe. Probing stops at the first index that fails to open, so
/// non-contiguous indices are treated as absent.
pub fn enumerate_devices(limit: u32) -> Vec<u32> {
    let mut available = Vec::new();

    for index in 0..limit {
        match V4l2Source::open(index) {
            Ok(mut source) => {
                match source.read_frame() {
                    Ok(_) => {
                        debug!(index, "Probe succeeded");
                        available.push(index);
                    }
                    Err(e) => {
                        debug!(index, error = %e, "Device opened but yielded no frame");
                    }
                }
                // source dropped here, releasing the device
            }
            Err(e) => {
                debug!(index, error = %e, "Probe stopped");
                break;
            }
        }
    }

    available
}
