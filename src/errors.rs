// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture core

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera/device-related errors
    Camera(CameraError),
    /// Still-photo capture errors
    Capture(CaptureError),
    /// Video recording errors
    Recording(RecordingError),
    /// Settings update errors
    Settings(SettingsError),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
#[derive(Debug, Clone)]
pub enum CameraError {
    /// The device could not be opened or configured
    Unavailable(String),
    /// A single frame read failed (transient; callers fall back to the cache)
    ReadFailed(String),
    /// No device is currently open
    NotOpen,
    /// A read failed and no cached frame exists yet
    FrameNotReady,
}

/// Still-photo capture errors
#[derive(Debug, Clone)]
pub enum CaptureError {
    /// The device read failed and no cached frame was available
    NoFallback,
    /// Image encoding failed
    Encoding(String),
    /// Writing the output file failed
    Save(String),
}

/// Video recording errors
#[derive(Debug, Clone)]
pub enum RecordingError {
    /// The encoder pipeline or output file could not be created
    EncoderInit(String),
    /// Error while feeding or finalizing the encoder
    Pipeline(String),
}

/// A settings field that failed validation or coercion
#[derive(Debug, Clone)]
pub struct SettingsError {
    /// Name of the offending field
    pub field: &'static str,
    /// Human-readable reason
    pub reason: String,
}

impl SettingsError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Recording(e) => write!(f, "Recording error: {}", e),
            AppError::Settings(e) => write!(f, "Settings error: {}", e),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::Unavailable(msg) => write!(f, "Device unavailable: {}", msg),
            CameraError::ReadFailed(msg) => write!(f, "Frame read failed: {}", msg),
            CameraError::NotOpen => write!(f, "No device is open"),
            CameraError::FrameNotReady => write!(f, "No frame available yet"),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NoFallback => write!(f, "Read failed with no cached frame"),
            CaptureError::Encoding(msg) => write!(f, "Encoding failed: {}", msg),
            CaptureError::Save(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingError::EncoderInit(msg) => write!(f, "Encoder init failed: {}", msg),
            RecordingError::Pipeline(msg) => write!(f, "Encoder pipeline error: {}", msg),
        }
    }
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value for '{}': {}", self.field, self.reason)
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for RecordingError {}
impl std::error::Error for SettingsError {}

// Conversions from sub-errors to AppError
impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<RecordingError> for AppError {
    fn from(err: RecordingError) -> Self {
        AppError::Recording(err)
    }
}

impl From<SettingsError> for AppError {
    fn from(err: SettingsError) -> Self {
        AppError::Settings(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Save(err.to_string())
    }
}
