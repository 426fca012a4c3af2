//! Outbound email delivery for the OTP password-reset flow.
//!
//! The forgot-password handler awaits the send and fails the whole request on
//! a transport error, so a reset request never "succeeds" without the user
//! receiving a code. The `EmailSender` trait keeps the transport swappable:
//! SMTP via `lettre` in production, a logging stub for local dev and tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

/// Email delivery abstraction consumed by the auth handlers.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error to fail the calling request.
    async fn send(&self, to_email: &str, subject: &str, html_body: &str) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, to_email: &str, subject: &str, html_body: &str) -> Result<()> {
        info!(
            to_email = %to_email,
            subject = %subject,
            body = %html_body,
            "email send stub"
        );
        Ok(())
    }
}

/// SMTP sender over a TLS relay.
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    /// Build a sender for the given relay and credentials.
    ///
    /// # Errors
    /// Returns an error if the relay host or `from` mailbox cannot be parsed.
    pub fn new(relay: &str, username: &str, password: &str, from: &str) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(relay)
            .with_context(|| format!("Invalid SMTP relay: {relay}"))?
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();

        let from = from
            .parse::<Mailbox>()
            .with_context(|| format!("Invalid from mailbox: {from}"))?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, to_email: &str, subject: &str, html_body: &str) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to_email
                .parse::<Mailbox>()
                .with_context(|| format!("Invalid recipient: {to_email}"))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .context("Failed to build email message")?;

        self.transport
            .send(message)
            .await
            .context("Failed to send email")?;

        Ok(())
    }
}

/// HTML body for the OTP email.
#[must_use]
pub fn otp_email_body(code: &str) -> String {
    format!(
        r#"<div style="font-family: Helvetica,Arial,sans-serif;line-height:2">
  <div style="margin:50px auto;width:70%;padding:20px 0">
    <div style="border-bottom:1px solid #eee">
      <span style="font-size:1.4em;color:#00466a;font-weight:600">Bookswap</span>
    </div>
    <p style="font-size:1.1em">Hi,</p>
    <p>Please find your OTP below for reset password. The OTP is valid for 5 minutes</p>
    <h2 style="background:#00466a;margin:0 auto;width:max-content;padding:0 10px;color:#fff;border-radius:4px;">{code}</h2>
    <p style="font-size:0.9em;">Regards,<br />Bookswap</p>
  </div>
</div>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_email_body_contains_code() {
        let body = otp_email_body("482910");
        assert!(body.contains("482910"));
        assert!(body.contains("valid for 5 minutes"));
    }

    #[tokio::test]
    async fn log_sender_always_succeeds() {
        let sender = LogEmailSender;
        let result = sender
            .send("a@x.com", "Your OTP", "<p>123456</p>")
            .await;
        assert!(result.is_ok());
    }

    #[test]
    fn smtp_sender_rejects_bad_from() {
        let sender = SmtpEmailSender::new("smtp.example.com", "user", "pass", "not a mailbox");
        assert!(sender.is_err());
    }
}
