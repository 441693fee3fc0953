//! Integration tests for the HTTP probe executor
//!
//! These tests verify that:
//! - Only a 200 within the deadline counts as up
//! - Slow endpoints are cut off at the deadline
//! - Method, headers and body reach the endpoint
//! - Transport failures become failed probes

use std::time::{Duration, Instant};

use healthchecker::{Check, HttpProber, Prober};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

const TIMEOUT: Duration = Duration::from_millis(500);

#[tokio::test]
async fn test_probe_200_is_up() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let check = resolve(&pinned_check("api", "api.example.com", &mock_server, "/health"));
    let outcome = HttpProber::new(TIMEOUT).probe(&check).await;

    assert!(outcome.success);
    assert_eq!(outcome.status, Some(200));
    assert!(outcome.error.is_none());
    assert!(outcome.elapsed < TIMEOUT);

    // Pinned address: no DNS lookup, but a fresh connection and a response
    assert_eq!(outcome.timings.dns, None);
    assert!(outcome.timings.connect.is_some());
    assert_eq!(outcome.timings.first_byte, Some(outcome.elapsed));
    assert!(outcome.timings.connect <= outcome.timings.first_byte);
}

#[tokio::test]
async fn test_probe_records_dns_lookup() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    // localhost has no domain to group by, so build the check by hand
    let check = Check {
        url: format!("http://localhost:{}/health", mock_server.address().port())
            .parse()
            .unwrap(),
        ip: None,
        ..resolve(&pinned_check("local", "api.example.com", &mock_server, "/health"))
    };

    let outcome = HttpProber::new(TIMEOUT).probe(&check).await;

    assert!(outcome.success, "error: {:?}", outcome.error);
    let dns = outcome.timings.dns.expect("no dns sample");
    assert!(dns <= outcome.elapsed);
    assert!(outcome.timings.connect.is_some());
}

#[tokio::test]
async fn test_probe_non_200_is_down() {
    let mock_server = MockServer::start().await;
    for (route, code) in [("/error", 500), ("/unavailable", 503), ("/created", 201)] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(code))
            .mount(&mock_server)
            .await;
    }

    let prober = HttpProber::new(TIMEOUT);
    for (route, code) in [("/error", 500), ("/unavailable", 503), ("/created", 201)] {
        let check = resolve(&pinned_check("api", "api.example.com", &mock_server, route));
        let outcome = prober.probe(&check).await;

        assert!(!outcome.success, "{route} should be down");
        assert_eq!(outcome.status, Some(code));
    }
}

#[tokio::test]
async fn test_redirect_is_not_followed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/health"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let check = resolve(&pinned_check("api", "api.example.com", &mock_server, "/old"));
    let outcome = HttpProber::new(TIMEOUT).probe(&check).await;

    assert!(!outcome.success);
    assert_eq!(outcome.status, Some(301));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_string("Slow response"),
        )
        .mount(&mock_server)
        .await;

    let check = resolve(&pinned_check("slow", "slow.example.com", &mock_server, "/slow"));

    let start = Instant::now();
    let outcome = HttpProber::new(TIMEOUT).probe(&check).await;
    let took = start.elapsed();

    assert!(!outcome.success);
    assert_eq!(outcome.status, None);
    assert!(outcome.error.is_some());
    assert!(
        took < TIMEOUT + Duration::from_millis(250),
        "probe returned after {took:?}"
    );
}

#[tokio::test]
async fn test_method_headers_and_body_are_sent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(header("x-token", "abc123"))
        .and(body_string("payload"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = pinned_check("submit", "api.example.com", &mock_server, "/submit");
    config.method = Some("post".to_string());
    config.headers.insert("X-Token".to_string(), "abc123".to_string());
    config.body = Some("payload".to_string());

    let outcome = HttpProber::new(TIMEOUT).probe(&resolve(&config)).await;

    // Anything that does not match the mock gets a 404
    assert!(outcome.success, "status was {:?}", outcome.status);
}

#[tokio::test]
async fn test_head_probe() {
    let mock_server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = pinned_check("web", "www.example.com", &mock_server, "/");
    config.method = Some("HEAD".to_string());

    let outcome = HttpProber::new(TIMEOUT).probe(&resolve(&config)).await;
    assert!(outcome.success);
}

#[tokio::test]
async fn test_connection_refused_is_down() {
    let check = resolve(&refused_check("down", "down.example.net"));

    let outcome = HttpProber::new(TIMEOUT).probe(&check).await;

    assert!(!outcome.success);
    assert_eq!(outcome.status, None);
    assert!(outcome.error.is_some());
    assert_eq!(outcome.timings.connect, None);
}

#[tokio::test]
async fn test_unresolvable_host_is_down_within_deadline() {
    let check = resolve(&healthchecker::CheckConfig {
        name: "nowhere".to_string(),
        url: "http://probe.does-not-exist.invalid/".to_string(),
        method: None,
        headers: Default::default(),
        body: None,
        ip: None,
    });

    let start = Instant::now();
    let outcome = HttpProber::new(TIMEOUT).probe(&check).await;

    assert!(!outcome.success);
    assert_eq!(outcome.status, None);
    assert!(start.elapsed() < TIMEOUT + Duration::from_millis(250));
}
