// SPDX-License-Identifier: GPL-3.0-only

//! Session controller
//!
//! Owns the frame guard, the settings record, and the recording and
//! timelapse state machines. Every operation the transport layer (or
//! the CLI) needs lives here: enumerate and select devices, update
//! settings, capture photos, start/stop recording, run timelapses,
//! stream frames, and tear the whole thing down.
//!
//! At most one recording and one timelapse exist at a time. Both run
//! as supervised background threads competing with the streaming path
//! for the one guard lock; cancellation is cooperative and teardown
//! joins the loops before releasing the device.

mod stream;

use crate::backends::camera::{enumerate_devices, CaptureSource, V4l2Source};
use crate::capture::{FrameGuard, LoopAction, TaskController};
use crate::config::Config;
use crate::constants::{RECORD_FPS, RECORD_TICK, STILL_JPEG_QUALITY};
use crate::errors::{AppError, AppResult, CameraError, CaptureError};
use crate::frame::Frame;
use crate::pipelines::photo;
use crate::pipelines::{GstAviSink, RecordingSink};
use crate::processing::apply_filters;
use crate::settings::{Settings, SettingsPatch};
use crate::storage::OutputLayout;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcome of a video start request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoStart {
    /// Recording began; frames go to this file
    Started(PathBuf),
    /// A recording is already in progress
    AlreadyRecording,
}

/// Outcome of a video stop request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoStop {
    /// Recording ended and the file was finalized
    Stopped(PathBuf),
    /// No recording was in progress
    NotRecording,
}

/// Outcome of a timelapse start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelapseStart {
    Started,
    AlreadyRunning,
}

/// Outcome of a timelapse stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelapseStop {
    Stopped,
    NotRunning,
}

struct RecordingState {
    recording: bool,
    task: Option<TaskController>,
    path: Option<PathBuf>,
}

struct TimelapseState {
    /// Shared with the loop so it can flip itself back to idle when
    /// the deadline elapses
    running: Arc<AtomicBool>,
    task: Option<TaskController>,
}

pub(crate) struct SessionInner {
    guard: FrameGuard,
    settings: Mutex<Settings>,
    layout: Mutex<OutputLayout>,
    recording: Mutex<RecordingState>,
    timelapse: Mutex<TimelapseState>,
    active: AtomicBool,
    probe_limit: u32,
}

impl SessionInner {
    /// One guarded read plus the full filter pass on a settings
    /// snapshot. The guard lock is released before filtering starts.
    pub(crate) fn read_filtered(&self) -> Result<Frame, CameraError> {
        let frame = self.guard.read_guarded()?;
        let settings = self.settings.lock().unwrap().clone();
        Ok(apply_filters(&frame, &settings))
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub(crate) fn is_device_open(&self) -> bool {
        self.guard.is_open()
    }
}

/// The capture core. Cheap to clone; all clones share one session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<SessionInner>,
}

impl SessionController {
    /// Create a controller with no open device.
    pub fn new(config: Config) -> AppResult<Self> {
        let layout = OutputLayout::new(&config.save_dir, &config.filename_prefix)?;

        Ok(Self {
            inner: Arc::new(SessionInner {
                guard: FrameGuard::new(),
                settings: Mutex::new(Settings::default()),
                layout: Mutex::new(layout),
                recording: Mutex::new(RecordingState {
                    recording: false,
                    task: None,
                    path: None,
                }),
                timelapse: Mutex::new(TimelapseState {
                    running: Arc::new(AtomicBool::new(false)),
                    task: None,
                }),
                active: AtomicBool::new(true),
                probe_limit: config.probe_limit,
            }),
        })
    }

    /// Probe for usable devices. No side effects beyond the transient
    /// probe opens.
    pub fn list_devices(&self) -> Vec<u32> {
        enumerate_devices(self.inner.probe_limit)
    }

    /// Open the device at `index`, releasing any current device first.
    ///
    /// Active recording and timelapse runs are stopped before the swap
    /// so no background loop ever reads a released handle. On failure
    /// the controller is left with no open device.
    pub fn select_device(&self, index: u32) -> Result<(u32, u32), AppError> {
        self.stop_video();
        self.stop_timelapse();
        self.inner.guard.clear();

        match V4l2Source::open(index) {
            Ok(source) => Ok(self.attach(Box::new(source))),
            Err(e) => {
                warn!(index, error = %e, "Device selection failed");
                Err(e.into())
            }
        }
    }

    /// Install an already-open capture source (a custom backend or a
    /// test mock) in place of a V4L2 device.
    pub fn install_source(&self, source: Box<dyn CaptureSource>) -> (u32, u32) {
        self.stop_video();
        self.stop_timelapse();
        self.attach(source)
    }

    fn attach(&self, source: Box<dyn CaptureSource>) -> (u32, u32) {
        let resolution = self.inner.guard.install(source);
        self.inner.settings.lock().unwrap().resolution = resolution;
        info!(
            width = resolution.0,
            height = resolution.1,
            "Capture source installed"
        );
        resolution
    }

    /// Whether a device is currently open.
    pub fn is_device_open(&self) -> bool {
        self.inner.is_device_open()
    }

    /// Whether the controller has not been torn down.
    pub fn is_active(&self) -> bool {
        self.inner.is_active()
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Settings {
        self.inner.settings.lock().unwrap().clone()
    }

    /// Validate and merge a partial settings update. The live record
    /// is untouched when any field fails.
    pub fn update_settings(&self, patch: &SettingsPatch) -> Result<Settings, AppError> {
        let mut settings = self.inner.settings.lock().unwrap();
        settings.apply(patch)?;
        debug!(settings = ?*settings, "Settings updated");
        Ok(settings.clone())
    }

    /// Re-target the output directory, creating it if absent.
    pub fn set_save_path(&self, dir: impl AsRef<Path>) -> AppResult<()> {
        self.inner
            .layout
            .lock()
            .unwrap()
            .retarget(dir.as_ref())?;
        Ok(())
    }

    /// Capture one still photo through the guard and filter pass.
    pub fn capture_photo(&self, name: &str) -> Result<PathBuf, AppError> {
        let frame = match self.inner.read_filtered() {
            Ok(frame) => frame,
            // A failed read with nothing cached is a capture failure,
            // not a retryable stream condition
            Err(CameraError::FrameNotReady) => return Err(CaptureError::NoFallback.into()),
            Err(e) => return Err(e.into()),
        };

        let path = self.inner.layout.lock().unwrap().still_path(name);
        photo::save_jpeg(&frame, &path, STILL_JPEG_QUALITY)?;
        Ok(path)
    }

    /// Start recording to an MJPEG/AVI file at the current settings
    /// resolution. Returns `AlreadyRecording` without touching the
    /// active session; `EncoderInit` failures leave the state idle.
    pub fn start_video(&self, name: &str) -> Result<VideoStart, AppError> {
        let mut rec = self.inner.recording.lock().unwrap();
        if rec.recording {
            return Ok(VideoStart::AlreadyRecording);
        }

        let path = self.inner.layout.lock().unwrap().video_path(name);
        let (width, height) = self.inner.settings.lock().unwrap().resolution;
        let sink = GstAviSink::create(&path, width, height, RECORD_FPS)?;

        Ok(self.spawn_recording(&mut rec, Box::new(sink), path))
    }

    /// Start recording into a caller-provided sink. This is the same
    /// state machine as `start_video` with the encoder swapped out.
    pub fn start_video_with_sink(
        &self,
        name: &str,
        sink: Box<dyn RecordingSink>,
    ) -> Result<VideoStart, AppError> {
        let mut rec = self.inner.recording.lock().unwrap();
        if rec.recording {
            return Ok(VideoStart::AlreadyRecording);
        }
        let path = self.inner.layout.lock().unwrap().video_path(name);
        Ok(self.spawn_recording(&mut rec, sink, path))
    }

    fn spawn_recording(
        &self,
        rec: &mut RecordingState,
        mut sink: Box<dyn RecordingSink>,
        path: PathBuf,
    ) -> VideoStart {
        // Reap a loop that ended on its own (device closed mid-run)
        if let Some(mut task) = rec.task.take() {
            task.join();
        }

        let inner = Arc::clone(&self.inner);
        let task = TaskController::start("video-recorder", move || {
            if !inner.guard.is_open() {
                debug!("Device closed, recording loop ending");
                return LoopAction::Stop;
            }

            match inner.read_filtered() {
                Ok(frame) => {
                    let (width, height) = sink.dimensions();
                    let frame = if frame.width() != width || frame.height() != height {
                        frame.resized(width, height)
                    } else {
                        frame
                    };
                    if let Err(e) = sink.write_frame(&frame) {
                        warn!(error = %e, "Dropped recording frame");
                    }
                }
                // One bad read never stops the recording
                Err(e) => debug!(error = %e, "Recording tick skipped"),
            }

            std::thread::sleep(RECORD_TICK);
            LoopAction::Continue
        });

        info!(path = %path.display(), "Recording started");
        rec.recording = true;
        rec.task = Some(task);
        rec.path = Some(path.clone());
        VideoStart::Started(path)
    }

    /// Stop an active recording, waiting for the loop to exit and the
    /// encoder to finalize. Idempotent.
    pub fn stop_video(&self) -> VideoStop {
        let mut rec = self.inner.recording.lock().unwrap();
        if !rec.recording {
            return VideoStop::NotRecording;
        }

        rec.recording = false;
        if let Some(mut task) = rec.task.take() {
            // Joining the thread drops the sink, which finalizes the
            // output file
            task.stop();
        }

        let path = rec.path.take().unwrap_or_default();
        info!(path = %path.display(), "Recording stopped");
        VideoStop::Stopped(path)
    }

    /// Whether a recording is in progress.
    pub fn is_recording(&self) -> bool {
        self.inner.recording.lock().unwrap().recording
    }

    /// Start an interval-capture run: one filtered still every
    /// `interval` until `duration` has elapsed. The run flips itself
    /// back to idle at the deadline; `stop_timelapse` cancels early.
    pub fn start_timelapse(
        &self,
        name: &str,
        interval: Duration,
        duration: Duration,
    ) -> TimelapseStart {
        let mut state = self.inner.timelapse.lock().unwrap();
        if state.running.load(Ordering::SeqCst) {
            return TimelapseStart::AlreadyRunning;
        }
        if let Some(mut task) = state.task.take() {
            task.join();
        }

        state.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&state.running);
        let inner = Arc::clone(&self.inner);
        let name = name.to_string();
        let started = Instant::now();
        let mut index = 0u32;

        let task = TaskController::start("timelapse", move || {
            if !running.load(Ordering::SeqCst) {
                return LoopAction::Stop;
            }
            if started.elapsed() >= duration {
                running.store(false, Ordering::SeqCst);
                info!(frames = index, "Timelapse finished");
                return LoopAction::Stop;
            }

            match inner.read_filtered() {
                Ok(frame) => {
                    let path = inner.layout.lock().unwrap().sequence_path(&name, index);
                    match photo::save_jpeg(&frame, &path, STILL_JPEG_QUALITY) {
                        Ok(()) => index += 1,
                        Err(e) => warn!(error = %e, "Timelapse frame not saved"),
                    }
                }
                Err(e) => debug!(error = %e, "Timelapse tick skipped"),
            }

            std::thread::sleep(interval);
            LoopAction::Continue
        });

        info!(?interval, ?duration, "Timelapse started");
        state.task = Some(task);
        TimelapseStart::Started
    }

    /// Cancel an active timelapse run. Idempotent.
    pub fn stop_timelapse(&self) -> TimelapseStop {
        let mut state = self.inner.timelapse.lock().unwrap();
        let was_running = state.running.swap(false, Ordering::SeqCst);
        if let Some(mut task) = state.task.take() {
            task.stop();
        }
        if was_running {
            info!("Timelapse cancelled");
            TimelapseStop::Stopped
        } else {
            TimelapseStop::NotRunning
        }
    }

    /// Whether a timelapse run is active.
    pub fn is_timelapse_active(&self) -> bool {
        self.inner
            .timelapse
            .lock()
            .unwrap()
            .running
            .load(Ordering::SeqCst)
    }

    /// Stop everything: background loops first, then the device. The
    /// streaming generator observes the inactive flag and terminates.
    /// Idempotent.
    pub fn teardown(&self) {
        self.inner.active.store(false, Ordering::SeqCst);
        self.stop_video();
        self.stop_timelapse();
        self.inner.guard.clear();
        info!("Session torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::mock::{FailingSource, MockSource, TestPattern};
    use crate::errors::RecordingError;
    use std::sync::atomic::AtomicU32;

    fn test_controller() -> (SessionController, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            save_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        (SessionController::new(config).unwrap(), dir)
    }

    fn mock_source() -> Box<MockSource> {
        Box::new(MockSource::new(32, 24).with_pattern(TestPattern::Solid([50, 100, 150])))
    }

    /// Sink that counts frames instead of encoding them
    struct CountingSink {
        frames: Arc<AtomicU32>,
        finished: Arc<AtomicBool>,
    }

    impl RecordingSink for CountingSink {
        fn dimensions(&self) -> (u32, u32) {
            (32, 24)
        }
        fn write_frame(&mut self, _frame: &Frame) -> Result<(), RecordingError> {
            self.frames.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn finish(&mut self) -> Result<(), RecordingError> {
            self.finished.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    impl Drop for CountingSink {
        fn drop(&mut self) {
            self.finished.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_photo_without_device() {
        let (controller, _dir) = test_controller();
        assert!(matches!(
            controller.capture_photo("shot"),
            Err(AppError::Camera(CameraError::NotOpen))
        ));
    }

    #[test]
    fn test_photo_with_mock_device() {
        let (controller, _dir) = test_controller();
        let resolution = controller.install_source(mock_source());
        assert_eq!(resolution, (32, 24));
        assert_eq!(controller.settings().resolution, (32, 24));

        let path = controller.capture_photo("shot").unwrap();
        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("capture_shot_"));
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn test_photo_with_failing_reads() {
        let (controller, _dir) = test_controller();
        controller.install_source(Box::new(FailingSource));
        assert!(matches!(
            controller.capture_photo("shot"),
            Err(AppError::Capture(CaptureError::NoFallback))
        ));
    }

    #[test]
    fn test_select_unopenable_device_leaves_nothing_open() {
        let (controller, _dir) = test_controller();
        // An index far past anything the test host could expose
        assert!(matches!(
            controller.select_device(250),
            Err(AppError::Camera(CameraError::Unavailable(_)))
        ));
        assert!(!controller.is_device_open());
        assert!(matches!(
            controller.capture_photo("shot"),
            Err(AppError::Camera(CameraError::NotOpen))
        ));
    }

    #[test]
    fn test_recording_state_machine() {
        let (controller, _dir) = test_controller();
        controller.install_source(mock_source());

        let frames = Arc::new(AtomicU32::new(0));
        let finished = Arc::new(AtomicBool::new(false));
        let sink = Box::new(CountingSink {
            frames: Arc::clone(&frames),
            finished: Arc::clone(&finished),
        });

        let started = controller.start_video_with_sink("clip", sink).unwrap();
        let VideoStart::Started(path) = started else {
            panic!("expected recording to start");
        };
        assert!(controller.is_recording());

        // A second start is rejected without disturbing the first
        let frames2 = Arc::new(AtomicU32::new(0));
        let second = controller
            .start_video_with_sink(
                "clip2",
                Box::new(CountingSink {
                    frames: Arc::clone(&frames2),
                    finished: Arc::new(AtomicBool::new(false)),
                }),
            )
            .unwrap();
        assert_eq!(second, VideoStart::AlreadyRecording);

        std::thread::sleep(Duration::from_millis(300));

        assert_eq!(controller.stop_video(), VideoStop::Stopped(path));
        assert!(!controller.is_recording());
        assert!(frames.load(Ordering::SeqCst) > 0);
        assert!(finished.load(Ordering::SeqCst));
        // The rejected sink never saw a frame
        assert_eq!(frames2.load(Ordering::SeqCst), 0);

        assert_eq!(controller.stop_video(), VideoStop::NotRecording);
    }

    #[test]
    fn test_timelapse_self_terminates() {
        let (controller, dir) = test_controller();
        controller.install_source(mock_source());

        let interval = Duration::from_millis(50);
        let duration = Duration::from_millis(160);
        assert_eq!(
            controller.start_timelapse("lapse", interval, duration),
            TimelapseStart::Started
        );
        assert_eq!(
            controller.start_timelapse("other", interval, duration),
            TimelapseStart::AlreadyRunning
        );

        // Wait out the deadline plus one slow iteration
        std::thread::sleep(Duration::from_millis(600));
        assert!(!controller.is_timelapse_active());

        let frames: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("capture_lapse_"))
            .collect();
        // At most ceil(duration / interval), and the mock never fails
        assert!(!frames.is_empty());
        assert!(frames.len() <= 4, "saved {} frames", frames.len());

        // Fully idle again: a new run may start
        assert_eq!(
            controller.start_timelapse("again", interval, Duration::from_secs(30)),
            TimelapseStart::Started
        );
        assert_eq!(controller.stop_timelapse(), TimelapseStop::Stopped);
        assert_eq!(controller.stop_timelapse(), TimelapseStop::NotRunning);
    }

    #[test]
    fn test_install_source_stops_background_runs() {
        let (controller, _dir) = test_controller();
        controller.install_source(mock_source());

        controller.start_timelapse(
            "lapse",
            Duration::from_millis(20),
            Duration::from_secs(60),
        );
        assert!(controller.is_timelapse_active());

        controller.install_source(mock_source());
        assert!(!controller.is_timelapse_active());
    }

    #[test]
    fn test_teardown_is_terminal_and_idempotent() {
        let (controller, _dir) = test_controller();
        controller.install_source(mock_source());

        controller.teardown();
        controller.teardown();

        assert!(!controller.is_active());
        assert!(!controller.is_device_open());
        assert!(matches!(
            controller.capture_photo("shot"),
            Err(AppError::Camera(CameraError::NotOpen))
        ));
    }

    #[test]
    fn test_update_settings_round_trip() {
        let (controller, _dir) = test_controller();
        let patch = SettingsPatch {
            brightness: Some(20),
            overlay_timestamp: Some(true),
            ..SettingsPatch::default()
        };
        let updated = controller.update_settings(&patch).unwrap();
        assert_eq!(updated.brightness, 20);
        assert!(updated.overlay_timestamp);

        let bad = SettingsPatch {
            contrast: Some(500),
            ..SettingsPatch::default()
        };
        assert!(controller.update_settings(&bad).is_err());
        // Prior state intact
        assert_eq!(controller.settings().brightness, 20);
    }
}
