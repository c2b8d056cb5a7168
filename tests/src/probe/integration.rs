use std::time::{Duration, Instant};

use certinfo_common::config::{OutputFormat, ProbeConfig};
use certinfo_common::network::proxy::ProxySpec;
use certinfo_common::network::target::expand_targets;
use certinfo_core::error::FetchError;
use certinfo_core::extractor::extract_details;
use certinfo_core::fetcher::{CertificateFetcher, TlsFetcher};
use certinfo_core::prober::perform_probe;
use certinfo_core::report::format_results;

use crate::util::{
    LOCALHOST, certificate, closed_port, spawn_connect_proxy, spawn_hello_recorder,
    spawn_silent_server, spawn_tls_server,
};

const TIMEOUT: Duration = Duration::from_secs(1);

fn fetcher(proxy: Option<ProxySpec>) -> TlsFetcher {
    TlsFetcher::new(TIMEOUT, proxy).unwrap()
}

#[tokio::test]
async fn fetch_certificate_from_local_server() {
    let (cert, key) = certificate("certinfo.test", &["certinfo.test", "www.certinfo.test"]);
    let addr = spawn_tls_server(cert.clone(), key).await;

    let fetched = fetcher(None).fetch(LOCALHOST, addr.port()).await.unwrap();
    assert_eq!(fetched, cert.to_vec());

    let details = extract_details(&fetched).unwrap();
    assert_eq!(details.common_name, "certinfo.test");
    assert_eq!(details.subject_alt_names, "certinfo.test;www.certinfo.test");
    assert_eq!(details.valid_to, "2099-12-31T00:00:00");
    assert!(details.expire_in_days > 0);
}

#[tokio::test]
async fn fetch_certificate_by_hostname() {
    let (cert, key) = certificate("localhost", &["localhost"]);
    let addr = spawn_tls_server(cert.clone(), key).await;

    let fetched = fetcher(None).fetch("localhost", addr.port()).await.unwrap();
    assert_eq!(fetched, cert.to_vec());
}

#[tokio::test]
async fn server_name_is_the_target_string() {
    let recorder = spawn_hello_recorder().await;
    let fetcher = fetcher(None);

    for target in ["localhost", "127.0.0.1"] {
        let result = fetcher.fetch(target, recorder.addr.port()).await;
        assert!(result.is_err(), "{result:?}");
    }

    assert_eq!(
        recorder.server_names(),
        vec![Some("localhost".to_string()), Some("127.0.0.1".to_string())]
    );
}

#[tokio::test]
async fn server_name_survives_the_tunnel() {
    let recorder = spawn_hello_recorder().await;
    let fetcher = fetcher(Some(ProxySpec::new(LOCALHOST, recorder.addr.port())));

    for target in ["certinfo.test.", "10.1.2.3"] {
        let result = fetcher.fetch(target, 443).await;
        assert!(result.is_err(), "{result:?}");
    }

    assert_eq!(
        recorder.connect_requests(),
        vec![
            "CONNECT certinfo.test.:443 HTTP/1.0\r\nConnection: close\r\n\r\n".to_string(),
            "CONNECT 10.1.2.3:443 HTTP/1.0\r\nConnection: close\r\n\r\n".to_string(),
        ]
    );
    assert_eq!(
        recorder.server_names(),
        vec![Some("certinfo.test.".to_string()), Some("10.1.2.3".to_string())]
    );
}

#[tokio::test]
async fn refused_connection_fails_fast() {
    let port = closed_port().await;

    let started = Instant::now();
    let result = fetcher(None).fetch(LOCALHOST, port).await;

    assert!(matches!(result, Err(FetchError::Connect { .. })), "{result:?}");
    assert!(started.elapsed() < TIMEOUT);
}

#[tokio::test]
async fn silent_server_times_out_during_handshake() {
    let addr = spawn_silent_server().await;

    let started = Instant::now();
    let result = fetcher(None).fetch(LOCALHOST, addr.port()).await;
    let elapsed = started.elapsed();

    assert!(matches!(result, Err(FetchError::HandshakeTimeout)), "{result:?}");
    assert!(elapsed >= TIMEOUT - Duration::from_millis(50), "{elapsed:?}");
    assert!(elapsed < TIMEOUT * 3, "{elapsed:?}");
}

#[tokio::test]
async fn fetch_through_connect_proxy() {
    let (cert, key) = certificate("localhost", &["localhost"]);
    let addr = spawn_tls_server(cert.clone(), key).await;
    let proxy = spawn_connect_proxy().await;

    let fetched = fetcher(Some(ProxySpec::new(LOCALHOST, proxy.addr.port())))
        .fetch(LOCALHOST, addr.port())
        .await
        .unwrap();
    assert_eq!(fetched, cert.to_vec());

    let requests = proxy.requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec![format!(
            "CONNECT 127.0.0.1:{} HTTP/1.0\r\nConnection: close\r\n\r\n",
            addr.port()
        )]
    );
}

#[tokio::test]
async fn silent_proxy_times_out() {
    let proxy = spawn_silent_server().await;

    let started = Instant::now();
    let result = fetcher(Some(ProxySpec::new(LOCALHOST, proxy.port())))
        .fetch("github.com", 443)
        .await;
    let elapsed = started.elapsed();

    assert!(result.as_ref().is_err_and(FetchError::is_timeout), "{result:?}");
    assert!(elapsed >= TIMEOUT - Duration::from_millis(50), "{elapsed:?}");
    assert!(elapsed < TIMEOUT * 3, "{elapsed:?}");
}

#[tokio::test]
async fn unreachable_proxy_is_a_connect_error() {
    let port = closed_port().await;

    let result = fetcher(Some(ProxySpec::new(LOCALHOST, port)))
        .fetch("github.com", 443)
        .await;
    assert!(matches!(result, Err(FetchError::Connect { .. })), "{result:?}");
}

#[tokio::test]
async fn probe_run_reports_only_reachable_targets() {
    let (cert, key) = certificate("localhost", &["localhost"]);
    let addr = spawn_tls_server(cert, key).await;

    let config = ProbeConfig {
        port: addr.port(),
        timeout: TIMEOUT,
        ..ProbeConfig::default()
    };
    let fetcher = TlsFetcher::from_config(&config).unwrap();

    // 127.0.0.0/31 expands to .0 and .1: only the latter has a listener.
    let targets = expand_targets(["localhost", "127.0.0.0/31", "no_such host"]);
    assert_eq!(targets.len(), 3);
    assert_eq!(
        targets.iter().collect::<Vec<_>>(),
        vec!["localhost", "127.0.0.0", "127.0.0.1"]
    );

    let results = perform_probe(&targets, &config, &fetcher, None).await;

    let probed: Vec<&str> = results.targets().map(String::as_str).collect();
    assert_eq!(probed, vec!["localhost", "127.0.0.1"]);

    let info = results.get("127.0.0.1").unwrap();
    assert_eq!(info.common_name, "localhost");
    assert_eq!(info.peername, "127.0.0.1");
    assert_eq!(info.peerport, addr.port());

    let json = format_results(&results, OutputFormat::Json).unwrap();
    assert!(json.contains("\"CN\": \"localhost\""));

    let csv = format_results(&results, OutputFormat::Csv).unwrap();
    assert_eq!(csv.lines().count(), 3);
}

#[tokio::test]
async fn probe_run_with_nothing_reachable_renders_empty() {
    let config = ProbeConfig {
        port: closed_port().await,
        timeout: TIMEOUT,
        ..ProbeConfig::default()
    };
    let fetcher = TlsFetcher::from_config(&config).unwrap();

    let results = perform_probe(&expand_targets([LOCALHOST]), &config, &fetcher, None).await;
    assert!(results.is_empty());
    assert_eq!(format_results(&results, OutputFormat::Table).unwrap(), "");
}

#[tokio::test]
async fn huge_timeout_does_not_overflow() {
    let port = closed_port().await;

    let fetcher = TlsFetcher::new(Duration::from_secs(u64::MAX), None).unwrap();
    let result = fetcher.fetch(LOCALHOST, port).await;
    assert!(matches!(result, Err(FetchError::Connect { .. })), "{result:?}");
}

#[tokio::test]
#[ignore]
async fn fetch_public_certificate() {
    let fetched = fetcher(None).fetch("github.com", 443).await.unwrap();
    let details = extract_details(&fetched).unwrap();
    assert!(details.common_name.contains("github.com"));
}
