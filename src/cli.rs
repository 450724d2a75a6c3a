//! Command-line interface definitions for sharepass.
//!
//! Uses clap's derive API. Every option is optional here so that unset
//! flags fall back to the config file and environment layers.

use clap::Parser;
use std::net::Ipv4Addr;

/// Share a password with one person on your local network.
///
/// Prompts for the password, prints a one-time URL and serves the password
/// to the first browser that opens it. Exits after delivery or on timeout.
#[derive(Parser, Debug, Default)]
#[command(name = "sharepass")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Copy sharing URL to clipboard [default: true]
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub copy: Option<bool>,

    /// Run as background process after entering password [default: true]
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub daemon: Option<bool>,

    /// Timeout before exiting (e.g. 60s, 10m, 1h30m) [default: 10m]
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Serve on this IPv4 address instead of looking up the host's own.
    #[arg(long, value_name = "IPV4")]
    pub address: Option<Ipv4Addr>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags() {
        let cli = Cli::try_parse_from(["sharepass"]).unwrap();
        assert_eq!(cli.copy, None);
        assert_eq!(cli.daemon, None);
        assert_eq!(cli.timeout, None);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_bool_flags() {
        let cli = Cli::try_parse_from(["sharepass", "--copy", "--daemon=false"]).unwrap();
        assert_eq!(cli.copy, Some(true));
        assert_eq!(cli.daemon, Some(false));
    }

    #[test]
    fn test_timeout_and_address() {
        let cli = Cli::try_parse_from([
            "sharepass",
            "--timeout",
            "90s",
            "--address",
            "10.0.0.5",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.timeout.as_deref(), Some("90s"));
        assert_eq!(cli.address, Some(Ipv4Addr::new(10, 0, 0, 5)));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_rejects_bad_address() {
        assert!(Cli::try_parse_from(["sharepass", "--address", "not-an-ip"]).is_err());
    }
}
