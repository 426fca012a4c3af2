use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::Result;
use secrecy::SecretString;

pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let action = Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        dsn: matches
            .get_one("dsn")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --dsn"))?,
    };

    let token_secret = matches
        .get_one("token-secret")
        .map(|s: &String| SecretString::from(s.to_string()))
        .ok_or_else(|| anyhow::anyhow!("missing required argument: --token-secret"))?;

    let token_ttl_hours = matches
        .get_one::<i64>("token-ttl-hours")
        .copied()
        .unwrap_or(24);

    let mut globals = GlobalArgs::new(token_secret, token_ttl_hours * 60 * 60);

    globals.smtp_relay = matches.get_one("smtp-relay").map(|s: &String| s.to_string());
    globals.smtp_username = matches
        .get_one("smtp-username")
        .map(|s: &String| s.to_string())
        .unwrap_or_default();
    globals.smtp_password = matches
        .get_one("smtp-password")
        .map_or_else(
            || SecretString::from(String::new()),
            |s: &String| SecretString::from(s.to_string()),
        );
    globals.smtp_from = matches
        .get_one("smtp-from")
        .map(|s: &String| s.to_string())
        .unwrap_or_default();

    Ok((action, globals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    #[test]
    fn test_handler_server_action() -> Result<()> {
        let matches = commands::new().get_matches_from(vec![
            "bookswap",
            "--port",
            "9090",
            "--dsn",
            "postgres://localhost/bookswap",
            "--token-secret",
            "secret",
            "--token-ttl-hours",
            "2",
        ]);

        let (action, globals) = handler(&matches)?;

        let Action::Server { port, dsn } = action;
        assert_eq!(port, 9090);
        assert_eq!(dsn, "postgres://localhost/bookswap");
        assert_eq!(globals.token_secret.expose_secret(), "secret");
        assert_eq!(globals.token_ttl_seconds, 2 * 60 * 60);
        assert!(globals.smtp_relay.is_none());

        Ok(())
    }
}
