use log::{debug, error, info};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::json;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::{Outcome, Uploader};
use crate::config::CloudStorageConfig;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{0} has no file name")]
    NoFileName(String),
}

/// Pushes captured images to a Dropbox-compatible `files/upload` endpoint.
pub struct CloudUploader {
    settings: CloudStorageConfig,
    client: Client,
}

impl CloudUploader {
    pub fn new(settings: CloudStorageConfig, client: Client) -> Self {
        Self { settings, client }
    }

    /// `/<dir_name>/<file name>`, or `/<file name>` without a directory.
    pub fn remote_path(&self, image: &Path) -> Result<String, UploadError> {
        let file_name = image
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| UploadError::NoFileName(image.display().to_string()))?;

        let dir = self.settings.dir_name.trim_matches('/');
        if dir.is_empty() {
            Ok(format!("/{file_name}"))
        } else {
            Ok(format!("/{dir}/{file_name}"))
        }
    }

    fn put_file(&self, image: &Path) -> Result<String, UploadError> {
        let remote_path = self.remote_path(image)?;
        let content = fs::read(image)?;
        let api_arg = json!({
            "path": remote_path,
            "mode": "add",
            "autorename": true,
            "mute": false,
        });

        let response = self
            .client
            .post(&self.settings.api_url)
            .timeout(Duration::from_secs(self.settings.timeout_secs))
            .bearer_auth(&self.settings.access_token)
            .header("Dropbox-API-Arg", api_arg.to_string())
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(content)
            .send()?
            .error_for_status()?;

        Ok(response.text()?)
    }
}

impl Uploader for CloudUploader {
    fn enabled(&self) -> bool {
        self.settings.enable
    }

    fn upload(&self, image: &Path) -> Outcome {
        // the sequencer checks `enabled()` and logs the pacing fallback itself
        if !self.settings.enable {
            debug!("cloud storage is disabled, {} kept locally", image.display());
            return Outcome::Disabled;
        }

        match self.put_file(image) {
            Ok(response) => {
                info!("response: {response}");
                info!("image uploaded: {}", image.display());
                Outcome::Sent(response)
            }
            Err(err) => {
                error!("upload of {} failed: {err}", image.display());
                Outcome::Failed(err.to_string())
            }
        }
    }
}
