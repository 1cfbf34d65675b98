use chrono::{DateTime, Local};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::traits::{Camera, CameraOpener};
use crate::config::{CameraConfig, ImageConfig};
use crate::notify::{Outcome, Uploader};
use crate::pacing::Pacer;

/// What one capture burst should produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureBurst {
    pub count: u32,
    pub delay: Duration,
    pub resolution: Option<(u32, u32)>,
    pub prefix: String,
    pub extension: String,
    pub directory: PathBuf,
}

impl CaptureBurst {
    pub fn new(camera: &CameraConfig, image: &ImageConfig, directory: &Path) -> Self {
        Self {
            count: image.count,
            delay: camera.shot_delay(),
            resolution: camera.resolution(),
            prefix: image.name_prefix.clone(),
            extension: image.filetype.clone(),
            directory: directory.to_path_buf(),
        }
    }

    /// `<prefix><YYYYMMDD_HHMMSS><extension>`
    pub fn file_name(&self, taken_at: DateTime<Local>) -> String {
        format!(
            "{}{}{}",
            self.prefix,
            taken_at.format("%Y%m%d_%H%M%S"),
            self.extension
        )
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BurstReport {
    pub captured: Vec<PathBuf>,
    pub uploaded: usize,
    /// Why the burst stopped before `count` images, if it did.
    pub aborted: Option<String>,
}

pub struct CaptureSequencer {
    settings: CameraConfig,
    burst: CaptureBurst,
    opener: Box<dyn CameraOpener>,
    uploader: Box<dyn Uploader>,
    pacer: Box<dyn Pacer>,
}

impl CaptureSequencer {
    pub fn new(
        settings: CameraConfig,
        burst: CaptureBurst,
        opener: Box<dyn CameraOpener>,
        uploader: Box<dyn Uploader>,
        pacer: Box<dyn Pacer>,
    ) -> Self {
        Self {
            settings,
            burst,
            opener,
            uploader,
            pacer,
        }
    }

    pub fn burst(&self) -> &CaptureBurst {
        &self.burst
    }

    /// Takes up to `count` pictures. The camera is released before this
    /// returns, however the burst ended.
    pub fn run(&mut self) -> BurstReport {
        let mut report = BurstReport::default();

        if !self.settings.enable {
            warn!("camera is disabled...");
            return report;
        }

        info!("initializing camera...");
        let mut camera = match self.opener.open(&self.settings) {
            Ok(camera) => camera,
            Err(err) => {
                error!("cannot initialize camera: {err}");
                report.aborted = Some(err.to_string());
                return report;
            }
        };

        // auto exposure and white balance need a moment after power-up
        if self.pacer.pause(self.settings.warm_up()) {
            info!("taking pictures...");
            self.shoot(camera.as_mut(), &mut report);
        } else {
            warn!("capture burst interrupted during camera warm-up");
            report.aborted = Some("interrupted".to_string());
        }
        drop(camera);

        info!(
            "capture burst finished: {} captured, {} uploaded",
            report.captured.len(),
            report.uploaded
        );
        report
    }

    fn shoot(&mut self, camera: &mut dyn Camera, report: &mut BurstReport) {
        let upload = self.uploader.enabled();
        if !upload {
            warn!(
                "cloud storage is disabled, pacing captures every {}s",
                self.burst.delay.as_secs()
            );
        }

        for shot in 1..=self.burst.count {
            if self.pacer.stopped() {
                warn!("capture burst interrupted after {} image(s)", shot - 1);
                report.aborted = Some("interrupted".to_string());
                return;
            }

            let name = self.burst.file_name(Local::now());
            let path = self.burst.directory.join(&name);

            if let Err(err) = camera.capture_to(&path) {
                error!("capture of {name} failed: {err}");
                report.aborted = Some(err.to_string());
                return;
            }
            info!("image captured: {name}");
            report.captured.push(path.clone());

            if upload {
                // the upload already took its share of the interval
                if let Outcome::Sent(_) = self.uploader.upload(&path) {
                    report.uploaded += 1;
                }
            } else if shot < self.burst.count && !self.pacer.pause(self.burst.delay) {
                warn!("capture burst interrupted after {shot} image(s)");
                report.aborted = Some("interrupted".to_string());
                return;
            }
        }
    }
}
