#![cfg(feature = "web")]
use crate::config::MailSettings;
use crate::record::FeedbackRecord;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Something that tells the maintainer about new feedback
pub trait FeedbackNotifier: Send + Sync {
    fn notify(&self, feedback: &FeedbackRecord) -> Result<(), MailError>;
}

/// Sends feedback notifications through an SMTP relay using STARTTLS
#[derive(Clone)]
pub struct Mailer {
    smtp: SmtpTransport,
    from: String,
    to: String,
}

impl Mailer {
    /// Set up the transport; no connection is made until the first send
    pub fn new(settings: &MailSettings) -> Result<Self, MailError> {
        let creds = Credentials::new(settings.username.clone(), settings.password.clone());

        let smtp = SmtpTransport::starttls_relay(&settings.relay)?
            .credentials(creds)
            .port(settings.port)
            .build();

        Ok(Mailer {
            smtp,
            from: settings.from.clone(),
            to: settings.to.clone(),
        })
    }

    fn message(&self, feedback: &FeedbackRecord) -> Result<Message, MailError> {
        Ok(Message::builder()
            .from(self.from.parse()?)
            .to(self.to.parse()?)
            .subject(feedback.title.clone())
            .body(feedback.notification_body())?)
    }
}

impl FeedbackNotifier for Mailer {
    fn notify(&self, feedback: &FeedbackRecord) -> Result<(), MailError> {
        let email = self.message(feedback)?;
        self.smtp.send(&email)?;
        Ok(())
    }
}
