//! Auth state and configuration.
//!
//! Everything that used to be ambient (signing secret, TTLs, mail transport)
//! is constructed once at startup and carried here explicitly.

use crate::api::email::EmailSender;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

const DEFAULT_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_OTP_TTL_SECONDS: i64 = 5 * 60;
const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    token_secret: SecretString,
    token_ttl_seconds: i64,
    otp_ttl_seconds: i64,
    min_password_length: usize,
}

impl AuthConfig {
    #[must_use]
    pub fn new(token_secret: SecretString) -> Self {
        Self {
            token_secret,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            otp_ttl_seconds: DEFAULT_OTP_TTL_SECONDS,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_otp_ttl_seconds(mut self, seconds: i64) -> Self {
        self.otp_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_min_password_length(mut self, length: usize) -> Self {
        self.min_password_length = length;
        self
    }

    pub(crate) fn token_secret(&self) -> &[u8] {
        self.token_secret.expose_secret().as_bytes()
    }

    pub(crate) fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }

    pub(crate) fn otp_ttl_seconds(&self) -> i64 {
        self.otp_ttl_seconds
    }

    pub(crate) fn min_password_length(&self) -> usize {
        self.min_password_length
    }
}

pub struct AuthState {
    config: AuthConfig,
    mailer: Arc<dyn EmailSender>,
}

impl AuthState {
    pub fn new(config: AuthConfig, mailer: Arc<dyn EmailSender>) -> Self {
        Self { config, mailer }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(crate) fn mailer(&self) -> &dyn EmailSender {
        self.mailer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::email::LogEmailSender;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new(SecretString::from("secret".to_string()));

        assert_eq!(config.token_secret(), b"secret");
        assert_eq!(config.token_ttl_seconds(), super::DEFAULT_TOKEN_TTL_SECONDS);
        assert_eq!(config.otp_ttl_seconds(), super::DEFAULT_OTP_TTL_SECONDS);
        assert_eq!(
            config.min_password_length(),
            super::DEFAULT_MIN_PASSWORD_LENGTH
        );

        let config = config
            .with_token_ttl_seconds(120)
            .with_otp_ttl_seconds(30)
            .with_min_password_length(12);

        assert_eq!(config.token_ttl_seconds(), 120);
        assert_eq!(config.otp_ttl_seconds(), 30);
        assert_eq!(config.min_password_length(), 12);
    }

    #[test]
    fn auth_state_exposes_config_and_mailer() {
        let config = AuthConfig::new(SecretString::from("secret".to_string()));
        let state = AuthState::new(config, Arc::new(LogEmailSender));
        assert_eq!(state.config().token_secret(), b"secret");
        let _mailer = state.mailer();
    }
}
