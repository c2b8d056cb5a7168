//! Local peers for the integration tests: a TLS server, an HTTP CONNECT
//! proxy, a ClientHello recorder and a server that accepts connections but
//! never answers.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rcgen::{CertificateParams, DnType, KeyPair};
use rustls::ServerConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;

pub const LOCALHOST: &str = "127.0.0.1";

/// Self-signed certificate for `common_name`, valid for `san`.
pub fn certificate(
    common_name: &str,
    san: &[&str],
) -> (CertificateDer<'static>, PrivateKeyDer<'static>) {
    let mut params =
        CertificateParams::new(san.iter().map(|name| name.to_string()).collect::<Vec<_>>())
            .unwrap();
    params.distinguished_name.push(DnType::CommonName, common_name);
    params.not_before = rcgen::date_time_ymd(2020, 1, 1);
    params.not_after = rcgen::date_time_ymd(2099, 12, 31);

    let key_pair = KeyPair::generate().unwrap();
    let cert = params.self_signed(&key_pair).unwrap();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));

    (cert.der().clone(), key)
}

/// Serves `cert` over TLS on a loopback port until the test ends.
pub async fn spawn_tls_server(
    cert: CertificateDer<'static>,
    key: PrivateKeyDer<'static>,
) -> SocketAddr {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert], key)
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                let Ok(mut tls) = acceptor.accept(stream).await else {
                    return;
                };
                let mut buf = [0u8; 1024];
                while let Ok(n) = tls.read(&mut buf).await {
                    if n == 0 {
                        break;
                    }
                }
            });
        }
    });

    addr
}

/// Accepts connections and keeps them open without ever sending a byte.
pub async fn spawn_silent_server() -> SocketAddr {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                drop(stream);
            });
        }
    });

    addr
}

/// A loopback port nothing listens on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// Minimal HTTP CONNECT proxy. Every request head it receives is recorded.
pub struct ConnectProxy {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<String>>>,
}

pub async fn spawn_connect_proxy() -> ConnectProxy {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let recorded = Arc::clone(&requests);
    tokio::spawn(async move {
        while let Ok((client, _)) = listener.accept().await {
            let recorded = Arc::clone(&recorded);
            tokio::spawn(async move {
                let _ = serve_tunnel(client, recorded).await;
            });
        }
    });

    ConnectProxy { addr, requests }
}

async fn serve_tunnel(
    mut client: TcpStream,
    recorded: Arc<Mutex<Vec<String>>>,
) -> std::io::Result<()> {
    let mut head = Vec::new();
    let mut buf = [0u8; 512];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = client.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        head.extend_from_slice(&buf[..n]);
    }

    let request = String::from_utf8_lossy(&head).to_string();
    recorded.lock().unwrap().push(request.clone());

    let authority = request
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("CONNECT "))
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or_default()
        .to_string();

    let Ok(mut upstream) = TcpStream::connect(authority.as_str()).await else {
        client.write_all(b"HTTP/1.0 502 Bad Gateway\r\n\r\n").await?;
        return Ok(());
    };

    client
        .write_all(b"HTTP/1.0 200 Connection established\r\n\r\n")
        .await?;
    tokio::io::copy_bidirectional(&mut client, &mut upstream).await?;
    Ok(())
}

/// Records the server name of every ClientHello it receives, then hangs up.
///
/// It also plays the proxy: a `CONNECT` request is acknowledged and the
/// ClientHello is read from the tunnel, so tunnelled targets need no DNS.
pub struct HelloRecorder {
    pub addr: SocketAddr,
    pub server_names: Arc<Mutex<Vec<Option<String>>>>,
    pub connect_requests: Arc<Mutex<Vec<String>>>,
}

impl HelloRecorder {
    pub fn server_names(&self) -> Vec<Option<String>> {
        self.server_names.lock().unwrap().clone()
    }

    pub fn connect_requests(&self) -> Vec<String> {
        self.connect_requests.lock().unwrap().clone()
    }
}

pub async fn spawn_hello_recorder() -> HelloRecorder {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_names: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
    let connect_requests: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let names = Arc::clone(&server_names);
    let requests = Arc::clone(&connect_requests);
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let names = Arc::clone(&names);
            let requests = Arc::clone(&requests);
            tokio::spawn(async move {
                let _ = record_hello(stream, names, requests).await;
            });
        }
    });

    HelloRecorder {
        addr,
        server_names,
        connect_requests,
    }
}

async fn record_hello(
    mut stream: TcpStream,
    names: Arc<Mutex<Vec<Option<String>>>>,
    requests: Arc<Mutex<Vec<String>>>,
) -> std::io::Result<()> {
    let mut header = [0u8; 5];
    stream.read_exact(&mut header).await?;

    if &header == b"CONNE" {
        let mut head = header.to_vec();
        let mut byte = [0u8; 1];
        while !head.ends_with(b"\r\n\r\n") {
            stream.read_exact(&mut byte).await?;
            head.push(byte[0]);
        }
        requests
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(&head).to_string());
        stream
            .write_all(b"HTTP/1.0 200 Connection established\r\n\r\n")
            .await?;
        stream.read_exact(&mut header).await?;
    }

    let length = u16::from_be_bytes([header[3], header[4]]) as usize;
    let mut record = header.to_vec();
    record.resize(5 + length, 0);
    stream.read_exact(&mut record[5..]).await?;

    names.lock().unwrap().push(client_hello_server_name(&record));
    Ok(())
}

/// The host name of the `server_name` extension of a ClientHello record, if any.
pub fn client_hello_server_name(record: &[u8]) -> Option<String> {
    // content type 22 (handshake), then handshake type 1 (client_hello)
    if record.first() != Some(&22) || record.get(5) != Some(&1) {
        return None;
    }
    let hello = record.get(9..)?;

    // legacy version and random
    let mut pos = 2 + 32;
    pos += 1 + *hello.get(pos)? as usize;
    pos += 2 + u16_at(hello, pos)? as usize;
    pos += 1 + *hello.get(pos)? as usize;

    let extensions_end = pos + 2 + u16_at(hello, pos)? as usize;
    pos += 2;
    while pos + 4 <= extensions_end {
        let kind = u16_at(hello, pos)?;
        let length = u16_at(hello, pos + 2)? as usize;
        pos += 4;
        if kind == 0 {
            // list length, name type, name length
            let name_length = u16_at(hello, pos + 3)? as usize;
            let name = hello.get(pos + 5..pos + 5 + name_length)?;
            return Some(String::from_utf8_lossy(name).to_string());
        }
        pos += length;
    }
    None
}

fn u16_at(bytes: &[u8], pos: usize) -> Option<u16> {
    Some(u16::from_be_bytes([*bytes.get(pos)?, *bytes.get(pos + 1)?]))
}
