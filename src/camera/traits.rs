//! Core traits and types for the capture burst.

use std::io;
use std::path::Path;
use thiserror::Error;

use crate::config::CameraConfig;

/// Error type for camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// Failed to open the video device.
    #[error("failed to open /dev/video{index}: {source}")]
    DeviceOpenFailed { index: usize, source: io::Error },
    /// Driver refused the requested pixel format.
    #[error("format not supported: {0}")]
    FormatNotSupported(String),
    /// Error during streaming operation.
    #[error("stream error: {0}")]
    Stream(io::Error),
    /// Driver handed back a frame without data.
    #[error("captured frame is empty")]
    EmptyFrame,
    /// Indicator LED could not be driven.
    #[error("indicator LED error: {0}")]
    Led(#[from] rppal::gpio::Error),
    /// Writing the image file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for camera operations.
pub type Result<T> = std::result::Result<T, CameraError>;

/// An opened, warmed-up camera. Dropping it releases the device.
pub trait Camera {
    /// Take one still and write it to `path`.
    fn capture_to(&mut self, path: &Path) -> Result<()>;
}

/// Acquires the camera for the duration of one capture burst.
pub trait CameraOpener {
    /// Open the device, apply resolution and indicator state, and wait for
    /// the configured warm-up time before returning.
    fn open(&self, settings: &CameraConfig) -> Result<Box<dyn Camera>>;
}
