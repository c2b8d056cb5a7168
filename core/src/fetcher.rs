//! # Certificate Fetcher
//!
//! Opens a TCP connection to a target, directly or through an HTTP proxy
//! tunnel, and runs a TLS handshake just far enough to read the peer's leaf
//! certificate. The certificate is never validated.
//!
//! Every fetch has a single deadline computed when it starts: name
//! resolution, connect, tunnel setup and handshake all share the configured
//! timeout.

pub mod tls;
mod tunnel;

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use openssl::ssl::SslContext;
use tokio::net::{TcpStream, lookup_host};
use tokio::time::{Instant, timeout_at};
use tracing::debug;

use certinfo_common::config::ProbeConfig;
use certinfo_common::network::proxy::ProxySpec;

use crate::error::FetchError;

/// Source of leaf certificates.
///
/// The prober only talks to this trait, so the network can be swapped out.
#[async_trait]
pub trait CertificateFetcher: Send + Sync {
    /// Returns the DER encoded certificate `host:port` presents.
    async fn fetch(&self, host: &str, port: u16) -> Result<Vec<u8>, FetchError>;
}

/// Fetches certificates over real TCP connections.
pub struct TlsFetcher {
    context: SslContext,
    timeout: Duration,
    proxy: Option<ProxySpec>,
}

impl TlsFetcher {
    pub fn new(timeout: Duration, proxy: Option<ProxySpec>) -> Result<Self, FetchError> {
        Ok(Self {
            context: tls::client_context()?,
            timeout,
            proxy,
        })
    }

    pub fn from_config(config: &ProbeConfig) -> Result<Self, FetchError> {
        Self::new(config.timeout, config.proxy.clone())
    }

    async fn open_stream(
        &self,
        host: &str,
        port: u16,
        deadline: Instant,
    ) -> Result<TcpStream, FetchError> {
        match &self.proxy {
            Some(proxy) => {
                let mut stream = connect(&proxy.host, proxy.port, deadline).await?;
                tunnel::open_tunnel(&mut stream, proxy, host, port, deadline).await?;
                Ok(stream)
            }
            None => connect(host, port, deadline).await,
        }
    }
}

#[async_trait]
impl CertificateFetcher for TlsFetcher {
    async fn fetch(&self, host: &str, port: u16) -> Result<Vec<u8>, FetchError> {
        let deadline = deadline_after(self.timeout);

        let stream = self.open_stream(host, port, deadline).await?;
        tls::fetch_peer_certificate(&self.context, host, stream, deadline).await
    }
}

/// Roughly thirty years, far enough for any timeout that does not fit an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// The instant `timeout` from now. Oversized timeouts saturate to [`FAR_FUTURE`].
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

/// `host:port`, with IPv6 literals bracketed.
pub(crate) fn endpoint(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// Resolves `host` and connects to the first address that accepts.
async fn connect(host: &str, port: u16, deadline: Instant) -> Result<TcpStream, FetchError> {
    let endpoint = endpoint(host, port);

    let addrs: Vec<SocketAddr> = match timeout_at(deadline, lookup_host((host, port))).await {
        Ok(Ok(addrs)) => addrs.collect(),
        Ok(Err(source)) => {
            return Err(FetchError::Resolve {
                host: host.to_string(),
                source,
            });
        }
        Err(_) => return Err(FetchError::ConnectTimeout(endpoint)),
    };

    let mut last_error = None;
    for addr in addrs {
        debug!("Connecting to {addr}");
        match timeout_at(deadline, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => return Ok(stream),
            Ok(Err(e)) => {
                debug!("Connection to {addr} failed: {e}");
                last_error = Some(e);
            }
            Err(_) => return Err(FetchError::ConnectTimeout(endpoint)),
        }
    }

    match last_error {
        Some(source) => Err(FetchError::Connect { endpoint, source }),
        None => Err(FetchError::NoAddress(host.to_string())),
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
