//! Email module for magic-link delivery.
//!
//! `Mailer` is the delivery seam; `SmtpMailer` is the production
//! implementation.

mod smtp;
mod templates;

pub use smtp::SmtpMailer;
pub use templates::MagicLinkEmail;

use async_trait::async_trait;
use thiserror::Error;

/// Email sending error
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Outbound message with both HTML and plain-text bodies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
}

/// Trait for email providers
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one message. Never retried by callers.
    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use parking_lot::Mutex;

    /// Records messages instead of delivering them.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<EmailMessage>>,
        pub fail: bool,
    }

    impl RecordingMailer {
        pub fn failing() -> Self {
            Self { fail: true, ..Default::default() }
        }

        pub fn sent(&self) -> Vec<EmailMessage> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::SendFailed("connection refused".to_string()));
            }
            self.sent.lock().push(message);
            Ok(())
        }
    }
}
