//! services/api/src/adapters/mailer.rs
//!
//! Delivery of one-time login codes. [`SmtpMailer`] wraps the `lettre` async
//! SMTP transport; [`LogMailer`] writes the code to the log and is used when
//! `SMTP_HOST` is not configured.

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::SmtpConfig;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

/// Sends a freshly issued one-time code to its owner.
#[async_trait]
pub trait CodeMailer: Send + Sync {
    async fn send_code(&self, to_email: &str, code: &str) -> Result<(), MailError>;
}

fn code_body(code: &str, ttl_minutes: i64) -> String {
    format!(
        "Your sign-in code is {code}\n\nIt expires in {ttl_minutes} minutes. \
         If you did not ask for it you can ignore this email."
    )
}

// ---------------------------------------------------------------------------
// SmtpMailer
// ---------------------------------------------------------------------------

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    ttl_minutes: i64,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, ttl_minutes: i64) -> Result<Self, MailError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?.port(config.port);

        if let (Some(user), Some(pass)) = (&config.user, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from_address: config.from_address.clone(),
            ttl_minutes,
        })
    }
}

#[async_trait]
impl CodeMailer for SmtpMailer {
    async fn send_code(&self, to_email: &str, code: &str) -> Result<(), MailError> {
        let email = Message::builder()
            .from(self.from_address.parse()?)
            .to(to_email.parse()?)
            .subject("Your sign-in code")
            .header(ContentType::TEXT_PLAIN)
            .body(code_body(code, self.ttl_minutes))
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport.send(email).await?;
        info!(to = to_email, "Sign-in code emailed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LogMailer
// ---------------------------------------------------------------------------

/// Development mailer: the code goes to the log instead of an inbox.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl CodeMailer for LogMailer {
    async fn send_code(&self, to_email: &str, code: &str) -> Result<(), MailError> {
        to_email.parse::<lettre::Address>()?;
        info!(to = to_email, code, "SMTP is not configured; logging sign-in code");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_mentions_code_and_expiry() {
        let body = code_body("042917", 10);
        assert!(body.contains("042917"));
        assert!(body.contains("10 minutes"));
    }

    #[tokio::test]
    async fn log_mailer_rejects_malformed_address() {
        let err = LogMailer.send_code("not-an-email", "123456").await.unwrap_err();
        assert!(err.to_string().contains("Email address parse error"));
        assert!(LogMailer.send_code("jo@example.com", "123456").await.is_ok());
    }
}
