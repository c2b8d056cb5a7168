use std::io;

use thiserror::Error;

/// Why no certificate could be obtained from a peer.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("no address found for {0}")]
    NoAddress(String),

    #[error("connection to {endpoint} failed: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    #[error("connection to {0} timed out")]
    ConnectTimeout(String),

    #[error("proxy {proxy} did not open a tunnel: {reason}")]
    Tunnel { proxy: String, reason: String },

    #[error("proxy {0} did not answer in time")]
    TunnelTimeout(String),

    #[error("TLS handshake timed out")]
    HandshakeTimeout,

    #[error("TLS handshake failed: {0}")]
    Tls(#[source] openssl::ssl::Error),

    #[error("TLS library error: {0}")]
    Config(#[from] openssl::error::ErrorStack),

    #[error("socket setup failed: {0}")]
    Socket(#[source] io::Error),

    #[error("'{0}' cannot be used as a TLS server name")]
    InvalidServerName(String),

    #[error("peer presented no certificate")]
    NoCertificate,
}

impl FetchError {
    /// Whether the probe ran out of time rather than being rejected.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            FetchError::ConnectTimeout(_) | FetchError::TunnelTimeout(_) | FetchError::HandshakeTimeout
        )
    }
}

/// Why a fetched certificate could not be turned into a record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("certificate could not be parsed: {0}")]
    Parse(String),

    #[error("certificate subject has no common name")]
    MissingCommonName,

    #[error("certificate has no subject alternative name extension")]
    MissingSubjectAltName,

    #[error("certificate validity {0} is out of range")]
    InvalidValidity(i64),
}

/// Failure of a single probe. Never aborts a run.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Rendering failure of the final report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("csv serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("report is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
