use thiserror::Error;

/// Malformed user input, rejected before any probe is started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is not a valid hostname or ip address")]
    InvalidTarget(String),

    #[error("{0} is not a valid proxy url")]
    InvalidProxy(String),

    #[error("proxy scheme '{0}' is not supported, use an http proxy")]
    UnsupportedProxyScheme(String),

    #[error("{0} is an invalid port number")]
    InvalidPort(String),

    #[error("{0} is not a positive int value")]
    NotPositive(String),
}
