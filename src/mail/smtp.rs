//! SMTP email provider implementation.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use super::{EmailMessage, MailError, Mailer};
use crate::config::SmtpConfig;

/// SMTP email provider.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Create a new SMTP provider.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let mut builder = if config.use_tls {
            let tls_params = TlsParameters::new(config.host.clone()).map_err(|e| {
                MailError::InvalidConfig(format!("TLS configuration error: {}", e))
            })?;

            // Port 465 uses implicit TLS (SMTPS), other ports use STARTTLS
            if config.port == 465 {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                    .map_err(|e| MailError::InvalidConfig(format!("SMTP relay error: {}", e)))?
                    .port(config.port)
                    .tls(Tls::Wrapper(tls_params))
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| MailError::InvalidConfig(format!("SMTP relay error: {}", e)))?
                    .port(config.port)
                    .tls(Tls::Required(tls_params))
            }
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host).port(config.port)
        };

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let from = format!("{} <{}>", config.sender_name, config.sender_email)
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidConfig(format!("Invalid from address: {}", e)))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        let to = message
            .to
            .parse::<Mailbox>()
            .map_err(|e| MailError::SendFailed(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.body_text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.body_html),
                    ),
            )
            .map_err(|e| MailError::SendFailed(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::SendFailed(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(use_tls: bool) -> SmtpConfig {
        SmtpConfig {
            host: "localhost".to_string(),
            port: 587,
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
            sender_name: "Recipe Costing".to_string(),
            sender_email: "no-reply@example.com".to_string(),
            use_tls,
        }
    }

    #[tokio::test]
    async fn builds_plain_transport() {
        assert!(SmtpMailer::new(&config(false)).is_ok());
    }

    #[tokio::test]
    async fn rejects_bad_sender_address() {
        let mut bad = config(false);
        bad.sender_email = "not an address".to_string();
        assert!(matches!(SmtpMailer::new(&bad), Err(MailError::InvalidConfig(_))));
    }
}
