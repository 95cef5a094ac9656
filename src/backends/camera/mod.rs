// SPDX-License-Identifier: GPL-3.0-only

//! Camera capture backend
//!
//! The capture source trait is the seam between the session core and
//! the V4L2 hardware layer; tests substitute a mock source through the
//! same trait.

pub mod enumeration;
pub mod format_converters;
#[cfg(test)]
pub mod mock;
pub mod v4l2;

pub use enumeration::enumerate_devices;
pub use v4l2::V4l2Source;

use crate::errors::CameraError;
use crate::frame::Frame;

/// An open capture device.
///
/// Implementations release the underlying device on drop; dropping an
/// already-released handle is a no-op by construction.
pub trait CaptureSource: Send {
    /// The negotiated capture resolution.
    fn resolution(&self) -> (u32, u32);

    /// Read one frame. Failure is transient: the caller decides
    /// whether to retry, fall back, or give up.
    fn read_frame(&mut self) -> Result<Frame, CameraError>;
}
