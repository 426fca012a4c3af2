use secrecy::SecretString;

/// Secrets and collaborator settings constructed once at startup and passed
/// explicitly to the components that need them.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub token_secret: SecretString,
    pub token_ttl_seconds: i64,
    pub smtp_relay: Option<String>,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    pub smtp_from: String,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(token_secret: SecretString, token_ttl_seconds: i64) -> Self {
        Self {
            token_secret,
            token_ttl_seconds,
            smtp_relay: None,
            smtp_username: String::new(),
            smtp_password: SecretString::from(String::new()),
            smtp_from: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(SecretString::from("hunter2".to_string()), 3600);
        assert_eq!(args.token_secret.expose_secret(), "hunter2");
        assert_eq!(args.token_ttl_seconds, 3600);
        assert!(args.smtp_relay.is_none());
        assert_eq!(args.smtp_password.expose_secret(), "");
    }
}
