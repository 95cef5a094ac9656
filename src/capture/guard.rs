// SPDX-License-Identifier: GPL-3.0-only

//! Mutual exclusion around the single capture source
//!
//! Everything that reads the device (the streaming generator, photo
//! capture, the recording loop, the timelapse loop) goes through one
//! lock here, so two readers can never interleave on the same physical
//! read. The lock covers exactly one read-and-cache step; filtering
//! and encoding happen on the caller's copy outside the lock.

use crate::backends::camera::CaptureSource;
use crate::errors::CameraError;
use crate::frame::Frame;
use std::sync::Mutex;
use tracing::{debug, warn};

struct GuardInner {
    source: Option<Box<dyn CaptureSource>>,
    last_frame: Option<Frame>,
}

/// Serialized access to the capture source plus the last-good-frame
/// cache.
pub struct FrameGuard {
    inner: Mutex<GuardInner>,
}

impl FrameGuard {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(GuardInner {
                source: None,
                last_frame: None,
            }),
        }
    }

    /// Install a capture source, releasing any previous one and its
    /// cached frame. Returns the source's negotiated resolution.
    pub fn install(&self, source: Box<dyn CaptureSource>) -> (u32, u32) {
        let resolution = source.resolution();
        let mut inner = self.inner.lock().unwrap();
        inner.source = Some(source);
        inner.last_frame = None;
        resolution
    }

    /// Release the current source and cache, if any. Idempotent.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.source = None;
        inner.last_frame = None;
    }

    /// Whether a source is currently installed.
    pub fn is_open(&self) -> bool {
        self.inner.lock().unwrap().source.is_some()
    }

    /// Perform one device read under the lock.
    ///
    /// On success the cache is replaced and a copy of the new frame is
    /// returned. On a transient read failure the cached frame is
    /// returned instead; `FrameNotReady` signals that no fallback
    /// exists yet and the caller should back off and retry.
    pub fn read_guarded(&self) -> Result<Frame, CameraError> {
        let mut inner = self.inner.lock().unwrap();

        let Some(source) = inner.source.as_mut() else {
            return Err(CameraError::NotOpen);
        };

        match source.read_frame() {
            Ok(frame) => {
                inner.last_frame = Some(frame.clone());
                Ok(frame)
            }
            Err(e) => match inner.last_frame.clone() {
                Some(cached) => {
                    debug!(error = %e, "Read failed, serving cached frame");
                    Ok(cached)
                }
                None => {
                    warn!(error = %e, "Read failed with no cached frame");
                    Err(CameraError::FrameNotReady)
                }
            },
        }
    }
}

impl Default for FrameGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::mock::{FailingSource, MockSource, TestPattern};
    use std::sync::Arc;

    #[test]
    fn test_read_without_source() {
        let guard = FrameGuard::new();
        assert!(matches!(guard.read_guarded(), Err(CameraError::NotOpen)));
        assert!(!guard.is_open());
    }

    #[test]
    fn test_read_caches_and_falls_back() {
        let guard = FrameGuard::new();
        let source = MockSource::new(4, 4)
            .with_pattern(TestPattern::Solid([200, 10, 10]))
            .failing_after(1);
        guard.install(Box::new(source));

        // First read succeeds and fills the cache
        let first = guard.read_guarded().unwrap();
        assert_eq!(first.pixel(0, 0), Some([200, 10, 10]));

        // Second read fails inside the source; the cache covers it
        let second = guard.read_guarded().unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn test_failure_without_cache() {
        let guard = FrameGuard::new();
        guard.install(Box::new(FailingSource));
        assert!(matches!(
            guard.read_guarded(),
            Err(CameraError::FrameNotReady)
        ));
    }

    #[test]
    fn test_install_replaces_source_and_cache() {
        let guard = FrameGuard::new();
        guard.install(Box::new(
            MockSource::new(4, 4).with_pattern(TestPattern::Solid([1, 1, 1])),
        ));
        guard.read_guarded().unwrap();

        let resolution = guard.install(Box::new(FailingSource));
        assert_eq!(resolution, (640, 480));
        // Old cache must not leak across sources
        assert!(matches!(
            guard.read_guarded(),
            Err(CameraError::FrameNotReady)
        ));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let guard = FrameGuard::new();
        guard.install(Box::new(MockSource::new(4, 4)));
        guard.clear();
        guard.clear();
        assert!(!guard.is_open());
    }

    #[test]
    fn test_concurrent_reads_never_tear() {
        // A source that alternates between two uniform colors; a torn
        // read or cache update would surface as a mixed frame.
        struct Alternating {
            state: u32,
        }
        impl CaptureSource for Alternating {
            fn resolution(&self) -> (u32, u32) {
                (16, 16)
            }
            fn read_frame(&mut self) -> Result<Frame, CameraError> {
                self.state = self.state.wrapping_add(1);
                let v = if self.state % 2 == 0 { 0 } else { 255 };
                Ok(Frame::filled(16, 16, [v, v, v]))
            }
        }

        let guard = Arc::new(FrameGuard::new());
        guard.install(Box::new(Alternating { state: 0 }));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let guard = Arc::clone(&guard);
            handles.push(std::thread::spawn(move || {
                for _ in 0..200 {
                    let frame = guard.read_guarded().unwrap();
                    let first = frame.data()[0];
                    assert!(
                        frame.data().iter().all(|&b| b == first),
                        "observed a torn frame"
                    );
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
