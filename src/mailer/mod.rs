//! SMTP delivery of alert messages.
//!
//! [`SmtpMailer`] wraps the blocking `lettre` SMTP transport. It makes a single
//! attempt per call; retries are left to whatever scheduler re-runs the check.

use crate::config::{SmtpConfig, TlsMode};
use crate::error::MailSendError;
use crate::monitor::{AlertMessage, Mailer};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Message, SmtpTransport, Transport};

pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<SmtpTransport, MailSendError> {
        let host = self.config.host.as_str();
        let builder = match self.config.tls {
            TlsMode::None => SmtpTransport::builder_dangerous(host),
            TlsMode::Starttls => SmtpTransport::builder_dangerous(host)
                .tls(Tls::Required(TlsParameters::new(host.to_string())?)),
            TlsMode::Wrapper => SmtpTransport::builder_dangerous(host)
                .tls(Tls::Wrapper(TlsParameters::new(host.to_string())?)),
        };

        let mut builder = builder
            .port(self.config.port)
            .timeout(self.config.timeout());

        if let Some((user, pass)) = self.config.credentials() {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        Ok(builder.build())
    }
}

/// Assembles the plain-text MIME message.
pub fn build_message(
    sender: &str,
    message: &AlertMessage,
    recipients: &[String],
) -> Result<Message, MailSendError> {
    if recipients.is_empty() {
        return Err(MailSendError::Build("no recipients".to_string()));
    }

    let mut builder = Message::builder()
        .from(sender.parse::<Mailbox>()?)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_PLAIN);

    for recipient in recipients {
        builder = builder.to(recipient.parse::<Mailbox>()?);
    }

    builder
        .body(message.body.clone())
        .map_err(|e| MailSendError::Build(e.to_string()))
}

impl Mailer for SmtpMailer {
    fn send(&self, message: &AlertMessage, recipients: &[String]) -> Result<(), MailSendError> {
        let sender = self
            .config
            .sender()
            .ok_or_else(|| MailSendError::Build("no sender address configured".to_string()))?;
        let email = build_message(sender, message, recipients)?;

        self.transport()?.send(&email)?;

        tracing::info!(
            host = %self.config.host,
            port = self.config.port,
            recipients = recipients.len(),
            "Alert email sent"
        );
        Ok(())
    }
}
