//! Environment-driven configuration.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `WARDEN_ADDR` | `0.0.0.0:3000` | listen address |
//! | `WARDEN_LOG_FORMAT` | `compact` | `compact` or `json` |
//! | `WARDEN_EXPOSE_ERRORS` | `false` | put full failure text in 500 bodies |
//! | `WARDEN_MAX_BODY` | `1048576` | request body limit in bytes, larger bodies get 413 |

use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::Error;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// 1 MiB.
pub(crate) const DEFAULT_MAX_BODY: usize = 1024 * 1024;

/// Output format of the tracing subscriber.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("compact") {
            Ok(Self::Compact)
        } else if s.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(())
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub log_format: LogFormat,
    /// Development aid. Never enable in production: collaborator errors can
    /// carry connection strings and query text.
    pub expose_internal_errors: bool,
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            log_format: LogFormat::Compact,
            expose_internal_errors: false,
            max_body_bytes: DEFAULT_MAX_BODY,
        }
    }
}

impl Config {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, so tests never touch the real
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let addr = lookup("WARDEN_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_owned());
        let addr = addr
            .parse::<SocketAddr>()
            .map_err(|e| Error::config("WARDEN_ADDR", format!("`{addr}`: {e}")))?;

        let log_format = match lookup("WARDEN_LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>().map_err(|()| {
                Error::config("WARDEN_LOG_FORMAT", format!("`{raw}` is not `compact` or `json`"))
            })?,
            None => LogFormat::default(),
        };

        let expose_internal_errors = match lookup("WARDEN_EXPOSE_ERRORS") {
            Some(raw) => parse_flag(&raw)
                .ok_or_else(|| Error::config("WARDEN_EXPOSE_ERRORS", format!("`{raw}` is not a boolean")))?,
            None => false,
        };

        let max_body_bytes = match lookup("WARDEN_MAX_BODY") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|e| Error::config("WARDEN_MAX_BODY", format!("`{raw}`: {e}")))?,
            None => DEFAULT_MAX_BODY,
        };

        Ok(Self { addr, log_format, expose_internal_errors, max_body_bytes })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.addr, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.log_format, LogFormat::Compact);
        assert!(!config.expose_internal_errors);
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY);
    }

    #[test]
    fn reads_every_variable() {
        let config = Config::from_lookup(lookup(&[
            ("WARDEN_ADDR", "127.0.0.1:8080"),
            ("WARDEN_LOG_FORMAT", "JSON"),
            ("WARDEN_EXPOSE_ERRORS", "1"),
            ("WARDEN_MAX_BODY", "4096"),
        ]))
        .unwrap();
        assert_eq!(config.addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.expose_internal_errors);
        assert_eq!(config.max_body_bytes, 4096);
    }

    #[test]
    fn rejects_bad_values() {
        let err = Config::from_lookup(lookup(&[("WARDEN_ADDR", "localhost")])).unwrap_err();
        assert!(matches!(err, Error::Config { key: "WARDEN_ADDR", .. }));

        let err = Config::from_lookup(lookup(&[("WARDEN_LOG_FORMAT", "xml")])).unwrap_err();
        assert!(matches!(err, Error::Config { key: "WARDEN_LOG_FORMAT", .. }));

        let err = Config::from_lookup(lookup(&[("WARDEN_EXPOSE_ERRORS", "maybe")])).unwrap_err();
        assert!(matches!(err, Error::Config { key: "WARDEN_EXPOSE_ERRORS", .. }));

        let err = Config::from_lookup(lookup(&[("WARDEN_MAX_BODY", "1mb")])).unwrap_err();
        assert!(matches!(err, Error::Config { key: "WARDEN_MAX_BODY", .. }));
    }
}
