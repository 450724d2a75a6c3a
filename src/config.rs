use crate::cli::Cli;
use crate::error::AppResult;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::net::Ipv4Addr;
use std::time::Duration;

const DEFAULT_TIMEOUT: &str = "10m";

/// Raw settings as read from the config layers.
#[derive(Debug, Deserialize, Clone)]
struct RawConfig {
    copy: bool,
    daemon: bool,
    timeout: String,
    #[serde(default)]
    address: Option<String>,
}

/// Validated run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareConfig {
    /// Copy the sharing URL to the clipboard
    pub copy: bool,
    /// Detach into the background after the password is entered
    pub daemon: bool,
    /// How long to wait for the recipient
    pub timeout: Duration,
    /// Address to serve on; looked up from the hostname when unset
    pub address: Option<Ipv4Addr>,
}

impl ShareConfig {
    /// Load configuration from file, environment and CLI flags
    pub fn load(cli: &Cli) -> AppResult<Self> {
        Self::load_with(cli, Environment::with_prefix("SHAREPASS"))
    }

    fn load_with(cli: &Cli, env: Environment) -> AppResult<Self> {
        let raw: RawConfig = Config::builder()
            .set_default("copy", true)?
            .set_default("daemon", true)?
            .set_default("timeout", DEFAULT_TIMEOUT)?
            // Optional sharepass.toml in the working directory
            .add_source(File::with_name("sharepass").required(false))
            // e.g. SHAREPASS_TIMEOUT=30s, SHAREPASS_COPY=false
            .add_source(env.try_parsing(true))
            .set_override_option("copy", cli.copy)?
            .set_override_option("daemon", cli.daemon)?
            .set_override_option("timeout", cli.timeout.clone())?
            .set_override_option("address", cli.address.map(|ip| ip.to_string()))?
            .build()?
            .try_deserialize()?;

        raw.validate()
    }
}

impl RawConfig {
    fn validate(self) -> AppResult<ShareConfig> {
        let timeout = parse_duration(&self.timeout)
            .map_err(|e| ConfigError::Message(format!("invalid timeout {:?}: {}", self.timeout, e)))?;

        let address = match self.address.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(addr) => Some(addr.parse::<Ipv4Addr>().map_err(|_| {
                ConfigError::Message(format!("invalid address {:?}: expected IPv4", addr))
            })?),
        };

        Ok(ShareConfig {
            copy: self.copy,
            daemon: self.daemon,
            timeout,
            address,
        })
    }
}

/// Parse a duration like `500ms`, `45s`, `10m` or `1h30m`.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let mut rest = input.trim();
    if rest.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total = Duration::ZERO;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            return Err(format!("expected a number at {:?}", rest));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|_| format!("number too large in {:?}", input))?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "ms" => Some(Duration::from_millis(value)),
            "s" => Some(Duration::from_secs(value)),
            "m" => value.checked_mul(60).map(Duration::from_secs),
            "h" => value.checked_mul(3600).map(Duration::from_secs),
            "" => return Err(format!("missing unit in {:?}", input)),
            unit => return Err(format!("unknown unit {:?}", unit)),
        };
        total = part
            .and_then(|part| total.checked_add(part))
            .ok_or_else(|| format!("duration too large: {:?}", input))?;
        rest = &rest[unit_len..];
    }

    if total.is_zero() {
        return Err("duration must be greater than zero".to_string());
    }
    Ok(total)
}

/// Render a duration the way it is usually typed, e.g. `10m0s`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    match (total / 3600, (total % 3600) / 60, total % 60) {
        (0, 0, 0) => format!("{}ms", duration.subsec_millis()),
        (0, 0, s) => format!("{}s", s),
        (0, m, s) => format!("{}m{}s", m, s),
        (h, m, s) => format!("{}h{}m{}s", h, m, s),
    }
}
