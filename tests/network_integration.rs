//! Probe and speed-test behavior against a local mock registry.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use npm_registry_manager::network::probe;
use npm_registry_manager::network::speedtest;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn probe_latency_measures_successful_get() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(120)))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let (success, latency_ms) =
        probe::probe_latency(&client, &format!("{}/", server.uri()), PROBE_TIMEOUT).await;

    assert!(success);
    // At least the injected delay; generous upper bound for local jitter
    assert!(latency_ms >= 120.0, "latency {latency_ms} below injected delay");
    assert!(latency_ms < 2000.0, "latency {latency_ms} unreasonably high");
}

#[tokio::test]
async fn probe_latency_reports_failure_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let (success, latency_ms) =
        probe::probe_latency(&client, &format!("{}/", server.uri()), PROBE_TIMEOUT).await;

    assert!(!success);
    assert_eq!(latency_ms, 0.0);
}

#[tokio::test]
async fn probe_latency_reports_failure_when_unreachable() {
    // Nothing listens on this port
    let client = reqwest::Client::new();
    let (success, latency_ms) =
        probe::probe_latency(&client, "http://127.0.0.1:1/", Duration::from_millis(500)).await;

    assert!(!success);
    assert_eq!(latency_ms, 0.0);
}

#[tokio::test]
async fn validate_accepts_responding_registry() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    // Without a trailing slash the URL is normalized before the request
    assert!(probe::validate_registry_url(&client, &server.uri()).await);
}

#[tokio::test]
async fn validate_rejects_client_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    assert!(!probe::validate_registry_url(&client, &format!("{}/", server.uri())).await);
}

#[tokio::test]
async fn registry_info_reports_package_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vue"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"name\":\"vue\"}"))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let info = probe::registry_info(&client, &format!("{}/", server.uri())).await;

    assert!(info.reachable);
    assert_eq!(info.status_code, Some(200));
    assert!(info.can_fetch_packages);
    assert!(info.error.is_none());
}

#[tokio::test]
async fn registry_info_without_package_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    // No mock for /vue; wiremock answers 404

    let client = reqwest::Client::new();
    let info = probe::registry_info(&client, &format!("{}/", server.uri())).await;

    assert!(info.reachable);
    assert!(!info.can_fetch_packages);
}

#[tokio::test]
async fn registry_info_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let info = probe::registry_info(&client, &format!("{}/", server.uri())).await;

    assert!(!info.reachable);
    assert_eq!(info.status_code, Some(503));
    assert!(!info.can_fetch_packages);
}

#[tokio::test]
async fn speed_test_emits_one_sample_per_registry_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fast/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let registries = vec![
        ("fast".to_string(), format!("{}/fast/", server.uri())),
        ("broken".to_string(), format!("{}/broken/", server.uri())),
    ];

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel(8);
    let client = reqwest::Client::new();
    let summary = speedtest::run_speed_test(
        registries,
        client,
        PROBE_TIMEOUT,
        progress_tx,
        CancellationToken::new(),
    )
    .await;

    assert!(!summary.cancelled);
    assert_eq!(summary.results.len(), 2);
    assert_eq!(summary.results[0].name, "fast");
    assert!(summary.results[0].success);
    assert!(summary.results[0].latency_ms > 0.0);
    assert_eq!(summary.results[1].name, "broken");
    assert!(!summary.results[1].success);
    assert_eq!(summary.results[1].latency_ms, 0.0);

    // Every result also arrived incrementally, in probe order
    let first = progress_rx.recv().await.unwrap();
    let second = progress_rx.recv().await.unwrap();
    assert_eq!(first.name, "fast");
    assert_eq!(second.name, "broken");
    assert!(progress_rx.try_recv().is_err());
}

#[tokio::test]
async fn speed_test_stops_on_cancellation() {
    let registries = vec![(
        "unused".to_string(),
        "http://127.0.0.1:1/".to_string(),
    )];

    let cancel = CancellationToken::new();
    cancel.cancel();

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel(8);
    let client = reqwest::Client::new();
    let summary =
        speedtest::run_speed_test(registries, client, PROBE_TIMEOUT, progress_tx, cancel).await;

    assert!(summary.cancelled);
    assert!(summary.results.is_empty());
    assert!(progress_rx.try_recv().is_err());
}
