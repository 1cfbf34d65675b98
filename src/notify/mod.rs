//! Outbound side effects of a motion episode.
//!
//! Each channel makes exactly one attempt and reports an [`Outcome`]; errors
//! are logged at the channel boundary and never reach the caller.

pub mod mail;
pub mod upload;
pub mod webhook;

use chrono::{DateTime, Local};
use std::path::Path;

pub use mail::MailSender;
pub use upload::CloudUploader;
pub use webhook::WebhookNotifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Delivered; carries the server's reply.
    Sent(String),
    /// Switched off in the configuration, nothing was attempted.
    Disabled,
    Failed(String),
}

impl Outcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }
}

/// One-shot alert channel fired at the start of a motion episode.
pub trait Notifier {
    fn name(&self) -> &'static str;

    fn notify(&self, detected_at: DateTime<Local>) -> Outcome;
}

/// Destination for captured images.
pub trait Uploader {
    fn enabled(&self) -> bool;

    /// A disabled uploader returns [`Outcome::Disabled`] without touching
    /// the file.
    fn upload(&self, image: &Path) -> Outcome;
}
