// SPDX-License-Identifier: GPL-3.0-only

//! Mock capture source for testing without hardware

use super::CaptureSource;
use crate::errors::CameraError;
use crate::frame::Frame;

/// Test pattern for generated frames
#[derive(Debug, Clone, Copy)]
pub enum TestPattern {
    /// Every pixel set to one RGB value
    Solid([u8; 3]),
    /// Horizontal gradient from black to white
    Gradient,
}

/// Mock source producing synthetic frames.
///
/// `fail_after` injects read failures once the given number of frames
/// has been delivered, which exercises the guard's fallback path.
pub struct MockSource {
    width: u32,
    height: u32,
    pattern: TestPattern,
    frames_read: u32,
    fail_after: Option<u32>,
}

impl MockSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pattern: TestPattern::Solid([128, 128, 128]),
            frames_read: 0,
            fail_after: None,
        }
    }

    pub fn with_pattern(mut self, pattern: TestPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Fail every read after `count` successful ones.
    pub fn failing_after(mut self, count: u32) -> Self {
        self.fail_after = Some(count);
        self
    }

    pub fn frames_read(&self) -> u32 {
        self.frames_read
    }
}

impl CaptureSource for MockSource {
    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        if let Some(limit) = self.fail_after {
            if self.frames_read >= limit {
                return Err(CameraError::ReadFailed("injected failure".to_string()));
            }
        }
        self.frames_read += 1;

        let frame = match self.pattern {
            TestPattern::Solid(rgb) => Frame::filled(self.width, self.height, rgb),
            TestPattern::Gradient => {
                let mut data = Vec::with_capacity((self.width * self.height * 3) as usize);
                for _ in 0..self.height {
                    for x in 0..self.width {
                        let v = ((x * 255) / self.width.max(1)) as u8;
                        data.extend_from_slice(&[v, v, v]);
                    }
                }
                Frame::from_rgb(self.width, self.height, data)
                    .unwrap_or_else(|| Frame::filled(self.width, self.height, [0, 0, 0]))
            }
        };

        Ok(frame)
    }
}

/// Source whose every read fails; for exercising no-fallback paths.
pub struct FailingSource;

impl CaptureSource for FailingSource {
    fn resolution(&self) -> (u32, u32) {
        (640, 480)
    }

    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        Err(CameraError::ReadFailed("device gone".to_string()))
    }
}
