use chrono::{DateTime, Local};
use log::{error, info, warn};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;

use super::{Notifier, Outcome};
use crate::config::WebhookConfig;

/// IFTTT Maker style trigger: a bare POST to a URL that embeds the event name
/// and the channel key.
pub struct WebhookNotifier {
    settings: WebhookConfig,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(settings: WebhookConfig, client: Client) -> Self {
        Self { settings, client }
    }

    pub fn trigger_url(&self) -> String {
        format!(
            "{}/{}/with/key/{}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.event_name,
            self.settings.channel_key
        )
    }

    /// Any HTTP reply counts as delivered, only transport errors fail.
    pub fn trigger(&self) -> Result<StatusCode, reqwest::Error> {
        let response = self
            .client
            .post(self.trigger_url())
            .timeout(Duration::from_secs(self.settings.timeout_secs))
            .send()?;
        Ok(response.status())
    }
}

impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn notify(&self, _detected_at: DateTime<Local>) -> Outcome {
        if !self.settings.enable {
            warn!("webhook is disabled...");
            return Outcome::Disabled;
        }

        match self.trigger() {
            Ok(status) => {
                info!("webhook notification sent successfully ({status})");
                Outcome::Sent(status.to_string())
            }
            Err(err) => {
                error!("webhook request error: {err}");
                Outcome::Failed(err.to_string())
            }
        }
    }
}
