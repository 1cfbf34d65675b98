//! V4L2 camera implementation using the v4l crate.

use log::{info, warn};
use rppal::gpio::{Gpio, OutputPin};
use std::fs;
use std::path::Path;
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use super::traits::{Camera, CameraError, CameraOpener, Result};
use crate::config::CameraConfig;

const MJPG: &[u8; 4] = b"MJPG";

/// Opens `/dev/video<device_index>` for every burst.
#[derive(Debug, Default, Clone, Copy)]
pub struct V4l2Opener;

impl CameraOpener for V4l2Opener {
    fn open(&self, settings: &CameraConfig) -> Result<Box<dyn Camera>> {
        Ok(Box::new(V4l2Camera::open(settings)?))
    }
}

/// V4L2 device delivering MJPG frames, so every frame is a complete JPEG.
pub struct V4l2Camera {
    device: Device,
    led: Option<OutputPin>,
}

impl V4l2Camera {
    pub fn open(settings: &CameraConfig) -> Result<Self> {
        let index = settings.device_index;
        let device =
            Device::new(index).map_err(|source| CameraError::DeviceOpenFailed { index, source })?;

        let mut fmt = device.format().map_err(CameraError::Stream)?;
        if let Some((width, height)) = settings.resolution() {
            fmt.width = width;
            fmt.height = height;
        }
        fmt.fourcc = FourCC::new(MJPG);

        let fmt = device.set_format(&fmt).map_err(CameraError::Stream)?;
        if fmt.fourcc.repr != *MJPG {
            return Err(CameraError::FormatNotSupported(format!("{:?}", fmt.fourcc)));
        }
        info!("camera resolution: {}x{}", fmt.width, fmt.height);

        let led = match settings.led_pin {
            Some(pin) => {
                let mut led = Gpio::new()?.get(pin)?.into_output();
                if settings.led_on {
                    led.set_high();
                } else {
                    led.set_low();
                }
                Some(led)
            }
            None => {
                if settings.led_on {
                    warn!("led_on is set but no led_pin is configured");
                }
                None
            }
        };

        Ok(Self { device, led })
    }
}

impl Camera for V4l2Camera {
    fn capture_to(&mut self, path: &Path) -> Result<()> {
        let mut stream =
            Stream::with_buffers(&self.device, Type::VideoCapture, 4).map_err(CameraError::Stream)?;
        let (buf, meta) = stream.next().map_err(CameraError::Stream)?;

        let used = match usize::try_from(meta.bytesused) {
            Ok(0) | Err(_) => buf.len(),
            Ok(used) => used.min(buf.len()),
        };
        let jpeg = buf
            .get(..used)
            .filter(|data| !data.is_empty())
            .ok_or(CameraError::EmptyFrame)?;

        fs::write(path, jpeg)?;
        Ok(())
    }
}

impl Drop for V4l2Camera {
    fn drop(&mut self) {
        if let Some(led) = self.led.as_mut() {
            led.set_low();
        }
        info!("stopping camera...");
    }
}
