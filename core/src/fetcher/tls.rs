//! TLS client setup and the certificate grabbing handshake.
//!
//! The handshake runs on a blocking thread over the plain socket, with the
//! socket timeouts set to what is left of the probe deadline.

use std::io::{ErrorKind, Read, Write};

use openssl::ssl::{HandshakeError, Ssl, SslConnector, SslContext, SslMethod, SslVerifyMode};
use tokio::net::TcpStream;
use tokio::task;
use tokio::time::{Instant, timeout_at};
use tracing::debug;

use crate::error::FetchError;

/// Client context with peer verification switched off.
///
/// The certificate is reported, not trusted.
pub fn client_context() -> Result<SslContext, FetchError> {
    let mut builder = SslConnector::builder(SslMethod::tls_client())?;
    builder.set_verify(SslVerifyMode::NONE);
    Ok(builder.build().into_context())
}

/// A session announcing `host` as server name, whatever its shape.
///
/// IP literals and trailing dots are sent unchanged.
pub(crate) fn client_session(context: &SslContext, host: &str) -> Result<Ssl, FetchError> {
    let mut ssl = Ssl::new(context)?;
    ssl.set_hostname(host)
        .map_err(|_| FetchError::InvalidServerName(host.to_string()))?;
    Ok(ssl)
}

/// Runs the handshake over `stream` and returns the peer's leaf certificate, DER encoded.
///
/// The handshake must finish before `deadline`. The session is closed right
/// after, TLS layer first and then the socket; no application data is exchanged.
pub(crate) async fn fetch_peer_certificate(
    context: &SslContext,
    host: &str,
    stream: TcpStream,
    deadline: Instant,
) -> Result<Vec<u8>, FetchError> {
    let ssl = client_session(context, host)?;

    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return Err(FetchError::HandshakeTimeout);
    }

    let stream = stream.into_std().map_err(FetchError::Socket)?;
    stream.set_nonblocking(false).map_err(FetchError::Socket)?;
    stream.set_read_timeout(Some(remaining)).map_err(FetchError::Socket)?;
    stream.set_write_timeout(Some(remaining)).map_err(FetchError::Socket)?;

    let host = host.to_string();
    let handshake = task::spawn_blocking(move || handshake(ssl, stream, &host));

    match timeout_at(deadline, handshake).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(FetchError::Socket(std::io::Error::other(join_error))),
        Err(_) => Err(FetchError::HandshakeTimeout),
    }
}

fn handshake<S: Read + Write>(ssl: Ssl, stream: S, host: &str) -> Result<Vec<u8>, FetchError> {
    let mut tls_stream = match ssl.connect(stream) {
        Ok(tls_stream) => tls_stream,
        Err(HandshakeError::WouldBlock(_)) => return Err(FetchError::HandshakeTimeout),
        Err(HandshakeError::SetupFailure(stack)) => return Err(FetchError::Config(stack)),
        Err(HandshakeError::Failure(mid)) => {
            let error = mid.into_error();
            let timed_out = error
                .io_error()
                .is_some_and(|e| matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut));
            return Err(if timed_out {
                FetchError::HandshakeTimeout
            } else {
                FetchError::Tls(error)
            });
        }
    };

    let ssl = tls_stream.ssl();
    debug!(
        "Handshake with {host} done: {}, {:?}",
        ssl.version_str(),
        ssl.current_cipher().map(|cipher| cipher.name())
    );

    let leaf = match ssl.peer_certificate() {
        Some(cert) => cert.to_der().map_err(FetchError::Config),
        None => Err(FetchError::NoCertificate),
    };

    if let Err(e) = tls_stream.shutdown() {
        debug!("Closing TLS session with {host} failed: {e}");
    }

    leaf
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
