use chrono::{DateTime, Local};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Message, SmtpTransport, Transport};
use log::{error, info, warn};
use std::time::Duration;
use thiserror::Error;

use super::{Notifier, Outcome};
use crate::config::MailConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("cannot build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Plain-text alert mail over SMTP.
pub struct MailSender {
    settings: MailConfig,
}

impl MailSender {
    pub fn new(settings: MailConfig) -> Self {
        Self { settings }
    }

    pub fn subject(&self, detected_at: DateTime<Local>) -> String {
        format!(
            "{}{}",
            self.settings.subject,
            detected_at.format("%d.%m.%Y - %H:%M")
        )
    }

    pub fn build_message(&self, detected_at: DateTime<Local>) -> Result<Message, MailError> {
        let from = Mailbox::new(
            Some(self.settings.name_from.clone()),
            self.settings.smtp_username.parse()?,
        );
        let to = Mailbox::new(
            Some(self.settings.name_to.clone()),
            self.settings.recipient_email.parse()?,
        );

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(self.subject(detected_at))
            .header(ContentType::TEXT_PLAIN)
            .body(self.settings.text.clone())?;
        Ok(message)
    }

    /// STARTTLS is opportunistic: used when `encrypt` is set and the server
    /// advertises it after EHLO.
    fn transport(&self) -> Result<SmtpTransport, MailError> {
        let tls = if self.settings.encrypt {
            Tls::Opportunistic(TlsParameters::new(self.settings.smtp_server.clone())?)
        } else {
            Tls::None
        };

        let mut builder = SmtpTransport::builder_dangerous(&self.settings.smtp_server)
            .port(self.settings.smtp_port)
            .tls(tls)
            .timeout(Some(Duration::from_secs(self.settings.timeout_secs)));

        if !self.settings.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.settings.smtp_username.clone(),
                self.settings.smtp_password.clone(),
            ));
        }

        Ok(builder.build())
    }

    /// Opens a connection, delivers one message and closes the connection
    /// again whether or not the delivery succeeded.
    pub fn send(&self, detected_at: DateTime<Local>) -> Result<String, MailError> {
        let message = self.build_message(detected_at)?;
        let transport = self.transport()?;

        info!(
            "opening mail connection to {}:{}",
            self.settings.smtp_server, self.settings.smtp_port
        );
        let response = transport.send(&message)?;

        Ok(format!(
            "{} {}",
            response.code(),
            response.message().collect::<Vec<_>>().join(" ")
        ))
    }
}

impl Notifier for MailSender {
    fn name(&self) -> &'static str {
        "mail"
    }

    fn notify(&self, detected_at: DateTime<Local>) -> Outcome {
        if !self.settings.enable {
            warn!("mail is disabled...");
            return Outcome::Disabled;
        }

        let outcome = match self.send(detected_at) {
            Ok(reply) => {
                info!("mail is sent successfully: {reply}");
                Outcome::Sent(reply)
            }
            Err(err) => {
                error!("mail was not sent: {err}");
                Outcome::Failed(err.to_string())
            }
        };
        info!("mail connection closed");
        outcome
    }
}
