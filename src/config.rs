//! Application settings loaded once at startup from a JSON document.
//!
//! Every group and every key has a compiled-in default. A missing, unreadable
//! or malformed file never stops the monitor: the caller gets the defaults and
//! a warning in the log.

use log::{info, warn};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::sensor::config::SensorConfig;

pub const CONFIG_FILE_NAME: &str = "monitor_conf.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io { path: String, source: io::Error },

    #[error("{path} is not a valid configuration document: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub debug: DebugConfig,
    pub camera: CameraConfig,
    #[serde(alias = "dropbox")]
    pub cloud_storage: CloudStorageConfig,
    #[serde(alias = "gpio")]
    pub sensor: SensorConfig,
    #[serde(alias = "ifttt")]
    pub webhook: WebhookConfig,
    pub image: ImageConfig,
    pub mail: MailConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DebugConfig {
    #[serde(deserialize_with = "flag")]
    pub run_once: bool,
    #[serde(deserialize_with = "flag")]
    pub enable_logging: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            run_once: false,
            enable_logging: true,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CameraConfig {
    #[serde(deserialize_with = "flag")]
    pub enable: bool,
    #[serde(deserialize_with = "flag")]
    pub led_on: bool,
    /// Seconds between two captures when uploads are disabled.
    pub recording_time_delay: u64,
    pub resolution_height: u32,
    pub resolution_width: u32,
    /// Seconds the sensor gets to settle its exposure after opening.
    pub warm_up_time: u64,
    /// `/dev/video<N>`
    pub device_index: usize,
    /// BCM pin wired to the camera indicator LED, if any.
    pub led_pin: Option<u8>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            enable: true,
            led_on: false,
            recording_time_delay: 60,
            resolution_height: 800,
            resolution_width: 1200,
            warm_up_time: 2,
            device_index: 0,
            led_pin: None,
        }
    }
}

impl CameraConfig {
    pub fn shot_delay(&self) -> Duration {
        Duration::from_secs(self.recording_time_delay)
    }

    pub fn warm_up(&self) -> Duration {
        Duration::from_secs(self.warm_up_time)
    }

    /// Resolution to request from the driver, `None` keeps the driver default.
    pub fn resolution(&self) -> Option<(u32, u32)> {
        (self.resolution_width > 0 && self.resolution_height > 0)
            .then_some((self.resolution_width, self.resolution_height))
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CloudStorageConfig {
    #[serde(deserialize_with = "flag")]
    pub enable: bool,
    pub dir_name: String,
    pub access_token: String,
    pub api_url: String,
    pub timeout_secs: u64,
}

impl Default for CloudStorageConfig {
    fn default() -> Self {
        Self {
            enable: true,
            dir_name: "motion_cam_mail".to_string(),
            access_token: String::new(),
            api_url: "https://content.dropboxapi.com/2/files/upload".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct WebhookConfig {
    #[serde(deserialize_with = "flag")]
    pub enable: bool,
    pub event_name: String,
    pub channel_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enable: false,
            event_name: String::new(),
            channel_key: String::new(),
            base_url: "https://maker.ifttt.com/trigger".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ImageConfig {
    pub count: u32,
    pub filetype: String,
    pub name_prefix: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            count: 10,
            filetype: ".jpg".to_string(),
            name_prefix: "motion_detected_at_".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MailConfig {
    #[serde(deserialize_with = "flag")]
    pub enable: bool,
    #[serde(deserialize_with = "flag")]
    pub encrypt: bool,
    pub name_from: String,
    pub name_to: String,
    pub recipient_email: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub subject: String,
    pub text: String,
    pub timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enable: true,
            encrypt: true,
            name_from: "Motion Monitor".to_string(),
            name_to: "Home".to_string(),
            recipient_email: String::new(),
            smtp_server: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            subject: "ALERT: motion detected @".to_string(),
            text: "Go check your Dropbox folder".to_string(),
            timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Parses a configuration document.
    pub fn from_json(path: &Path, content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(path, &content)
    }

    /// Loads `path`, substituting the defaults for anything that goes wrong.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.is_file() {
            warn!("using default values. {} does not exist", path.display());
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => {
                info!("loaded configuration from {}", path.display());
                config
            }
            Err(err) => {
                warn!("using default values. {err}");
                Self::default()
            }
        }
    }
}

/// Accepts `true`/`false` as JSON booleans or as the strings `"true"`/`"false"`.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected \"true\" or \"false\", found {other:?}"
            ))),
        },
    }
}
