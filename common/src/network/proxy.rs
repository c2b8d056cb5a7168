//! # Proxy Resolution
//!
//! Decides which HTTP proxy, if any, the probes tunnel through.
//!
//! Resolution is a pure function of the explicit `--proxy` value and a
//! snapshot of the process environment taken once per run:
//! * An explicit value always wins. An explicit empty value means "no proxy",
//!   even when proxy variables are set.
//! * Otherwise the first variable present among [`PROXY_ENV_VARS`] is used.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::ValidationError;
use crate::network::validate;

pub const DEFAULT_PROXY_PORT: u16 = 3128;

/// Environment variables consulted for a proxy, highest priority first.
pub const PROXY_ENV_VARS: [&str; 4] = ["http_proxy", "HTTP_PROXY", "https_proxy", "HTTPS_PROXY"];

static PROXY_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<scheme>[A-Za-z][A-Za-z0-9+.-]*)://)?(?P<host>[^:/\s]+)(?::(?P<port>\d+))?$")
        .expect("proxy url pattern is valid")
});

/// An HTTP proxy able to open `CONNECT` tunnels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxySpec {
    pub host: String,
    pub port: u16,
}

impl ProxySpec {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn scheme(&self) -> &'static str {
        "http"
    }
}

impl fmt::Display for ProxySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme(), self.host, self.port)
    }
}

impl FromStr for ProxySpec {
    type Err = ValidationError;

    /// Parses `[protocol://]host[:port]`.
    ///
    /// `http` is assumed when the protocol is omitted and `https` is treated
    /// the same way, since both reach the proxy over plain HTTP. The port
    /// defaults to [`DEFAULT_PROXY_PORT`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidProxy(s.to_string());
        let caps = PROXY_URL.captures(s).ok_or_else(invalid)?;

        let scheme = caps
            .name("scheme")
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_else(|| "http".to_string());
        match scheme.as_str() {
            "http" | "https" => {}
            "socks" => return Err(ValidationError::UnsupportedProxyScheme(scheme)),
            _ => return Err(invalid()),
        }

        let host = caps.name("host").map(|m| m.as_str()).ok_or_else(invalid)?;
        if !validate::is_hostname(host) && !validate::is_ip_address(host) {
            return Err(ValidationError::InvalidTarget(host.to_string()));
        }

        let port = match caps.name("port") {
            Some(m) => parse_port(m.as_str())?,
            None => DEFAULT_PROXY_PORT,
        };

        Ok(ProxySpec::new(host, port))
    }
}

/// Parses a TCP port in `1..=65535`.
pub fn parse_port(s: &str) -> Result<u16, ValidationError> {
    match s.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ValidationError::InvalidPort(s.to_string())),
    }
}

/// Parses a proxy url where the empty string means "no proxy".
pub fn parse_proxy_url(s: &str) -> Result<Option<ProxySpec>, ValidationError> {
    if s.is_empty() {
        return Ok(None);
    }
    s.parse().map(Some)
}

/// Returns the raw proxy value from the environment snapshot, if any variable is present.
pub fn proxy_from_env(env: &HashMap<String, String>) -> Option<&str> {
    for key in PROXY_ENV_VARS {
        if let Some(value) = env.get(key) {
            debug!("Environment variable {key} found with value: {value}");
            return Some(value.as_str());
        }
    }

    debug!("No proxy environment variable found.");
    None
}

/// Resolves the proxy for this run.
///
/// `explicit` is the user supplied value, `None` when it was not given at all.
pub fn resolve_proxy(
    explicit: Option<&str>,
    env: &HashMap<String, String>,
) -> Result<Option<ProxySpec>, ValidationError> {
    let raw = match explicit {
        Some(value) => value,
        None => proxy_from_env(env).unwrap_or(""),
    };

    let proxy = parse_proxy_url(raw)?;
    match &proxy {
        Some(spec) => debug!("Using proxy {spec}"),
        None => debug!("Connecting directly, no proxy configured"),
    }
    Ok(proxy)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
