//! HTTP `CONNECT` tunnelling through a proxy.
//!
//! Once the tunnel is up the stream carries the TLS session to the target
//! unchanged, so the proxy never sees the handshake.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

use certinfo_common::network::proxy::ProxySpec;

use crate::error::FetchError;
use crate::fetcher::endpoint;

const MAX_RESPONSE_HEAD: usize = 8 * 1024;
const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// The request written to the proxy, byte for byte.
pub(crate) fn connect_request(host: &str, port: u16) -> String {
    format!(
        "CONNECT {} HTTP/1.0\r\nConnection: close\r\n\r\n",
        endpoint(host, port)
    )
}

/// Asks the proxy behind `stream` for a tunnel to `host:port`.
///
/// The response head is consumed so the TLS handshake starts on a clean
/// stream. A non-2xx status is only logged: the handshake is attempted
/// anyway and fails on its own if the proxy refused.
pub(crate) async fn open_tunnel<S>(
    stream: &mut S,
    proxy: &ProxySpec,
    host: &str,
    port: u16,
    deadline: Instant,
) -> Result<(), FetchError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = connect_request(host, port);
    debug!("Requesting tunnel to {} from {proxy}", endpoint(host, port));

    let io_failed = |e: std::io::Error| FetchError::Tunnel {
        proxy: proxy.to_string(),
        reason: e.to_string(),
    };

    timeout_at(deadline, stream.write_all(request.as_bytes()))
        .await
        .map_err(|_| FetchError::TunnelTimeout(proxy.to_string()))?
        .map_err(io_failed)?;

    let head = timeout_at(deadline, read_response_head(stream))
        .await
        .map_err(|_| FetchError::TunnelTimeout(proxy.to_string()))?
        .map_err(io_failed)?;

    match status_code(&head) {
        Some(code) if (200..300).contains(&code) => debug!("Tunnel established by {proxy} ({code})"),
        Some(code) => warn!("Proxy {proxy} answered {code} to CONNECT, trying the handshake anyway"),
        None => warn!("Proxy {proxy} sent an unreadable CONNECT response"),
    }

    Ok(())
}

async fn read_response_head<S>(stream: &mut S) -> std::io::Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let mut head: Vec<u8> = Vec::with_capacity(256);
    let mut buf = [0u8; 512];

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            if head.is_empty() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed without a response",
                ));
            }
            break;
        }

        head.extend_from_slice(&buf[..n]);
        if head.windows(HEAD_TERMINATOR.len()).any(|w| w == HEAD_TERMINATOR)
            || head.len() >= MAX_RESPONSE_HEAD
        {
            break;
        }
    }

    Ok(head)
}

/// Status code of the first response line, e.g. `HTTP/1.1 200 Connection established`.
fn status_code(head: &[u8]) -> Option<u16> {
    let head = std::str::from_utf8(head).ok()?;
    let status_line = head.lines().next()?;

    let mut parts = status_line.split_whitespace();
    let version = parts.next()?;
    if !version.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
