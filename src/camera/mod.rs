//! Capture bursts: a fixed number of stills at a fixed interval, each one
//! optionally handed to the uploader before the next is taken.

pub mod device;
pub mod sequencer;
pub mod traits;

#[cfg(test)]
pub mod mock;

pub use device::{V4l2Camera, V4l2Opener};
pub use sequencer::{BurstReport, CaptureBurst, CaptureSequencer};
pub use traits::{Camera, CameraError, CameraOpener};
