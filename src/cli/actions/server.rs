use crate::api::{
    self,
    email::{EmailSender, LogEmailSender, SmtpEmailSender},
    handlers::auth::AuthConfig,
};
use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use std::sync::Arc;

/// Handle the server action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Server { port, dsn } => {
            let config = AuthConfig::new(globals.token_secret.clone())
                .with_token_ttl_seconds(globals.token_ttl_seconds);

            // Without an SMTP relay, OTP emails are logged instead of sent.
            let sender: Arc<dyn EmailSender> = match &globals.smtp_relay {
                Some(relay) => Arc::new(
                    SmtpEmailSender::new(
                        relay,
                        &globals.smtp_username,
                        globals.smtp_password.expose_secret(),
                        &globals.smtp_from,
                    )
                    .context("Failed to build SMTP email sender")?,
                ),
                None => Arc::new(LogEmailSender),
            };

            api::new(port, dsn, config, sender).await?;
        }
    }

    Ok(())
}
