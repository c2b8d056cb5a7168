use std::time::Duration;

use crate::error::ValidationError;
use crate::network::proxy::ProxySpec;

pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Rendering of the final result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
    Csv,
    Raw,
}

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// TCP port probed on every target.
    pub port: u16,
    /// Budget of a single probe, from connect to finished handshake.
    pub timeout: Duration,
    pub proxy: Option<ProxySpec>,
    /// Maximum number of probes in flight.
    pub workers: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
            workers: 1,
        }
    }
}

/// Parses a strictly positive integer, as taken by `--timeout` and `--workers`.
pub fn parse_positive(s: &str) -> Result<u64, ValidationError> {
    match s.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ValidationError::NotPositive(s.to_string())),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
