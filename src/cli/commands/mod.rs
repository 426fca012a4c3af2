use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("bookswap")
        .about("Peer-to-peer book exchange directory")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("BOOKSWAP_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("dsn")
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .env("BOOKSWAP_DSN")
                .required(true),
        )
        .arg(
            Arg::new("token-secret")
                .long("token-secret")
                .help("Secret used to sign bearer tokens")
                .env("BOOKSWAP_TOKEN_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("token-ttl-hours")
                .long("token-ttl-hours")
                .help("Bearer token validity window in hours")
                .default_value("24")
                .env("BOOKSWAP_TOKEN_TTL_HOURS")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("smtp-relay")
                .long("smtp-relay")
                .help("SMTP relay host for outbound OTP email, example: smtp.gmail.com (omit to log emails instead)")
                .env("BOOKSWAP_SMTP_RELAY"),
        )
        .arg(
            Arg::new("smtp-username")
                .long("smtp-username")
                .help("SMTP username")
                .env("BOOKSWAP_SMTP_USERNAME")
                .default_value(""),
        )
        .arg(
            Arg::new("smtp-password")
                .long("smtp-password")
                .help("SMTP password")
                .env("BOOKSWAP_SMTP_PASSWORD")
                .default_value(""),
        )
        .arg(
            Arg::new("smtp-from")
                .long("smtp-from")
                .help("From mailbox for outbound email, example: Bookswap <no-reply@bookswap.dev>")
                .env("BOOKSWAP_SMTP_FROM")
                .default_value("Bookswap <no-reply@localhost>"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("BOOKSWAP_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "bookswap");
        assert_eq!(
            command.get_about().unwrap().to_string(),
            "Peer-to-peer book exchange directory"
        );
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_check_port_and_dsn() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "bookswap",
            "--port",
            "8081",
            "--dsn",
            "postgres://localhost/bookswap",
            "--token-secret",
            "secret",
        ]);

        assert_eq!(matches.get_one::<u16>("port").copied(), Some(8081));
        assert_eq!(
            matches.get_one::<String>("dsn").map(String::as_str),
            Some("postgres://localhost/bookswap")
        );
        assert_eq!(matches.get_one::<i64>("token-ttl-hours").copied(), Some(24));
    }

    #[test]
    fn test_verbosity_count() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "bookswap",
            "--dsn",
            "postgres://localhost/bookswap",
            "--token-secret",
            "secret",
            "-vvv",
        ]);

        assert_eq!(matches.get_one::<u8>("verbosity").copied(), Some(3));
    }
}
