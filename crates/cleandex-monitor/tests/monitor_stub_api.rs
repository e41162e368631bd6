//! Monitoring runs against a local stub API.
//!
//! The real-network test is ignored by default. Run it with:
//! ```bash
//! cargo test --package cleandex-monitor --test monitor_stub_api -- --ignored --nocapture
//! ```

use cleandex_common::MonitorSettings;
use cleandex_monitor::{EndpointStatus, Monitor, MonitorRequest};
use cleandex_test_utils::{StubApi, STUB_API_KEY, STUB_BEARER_TOKEN};
use pretty_assertions::assert_eq;
use serde_json::json;

fn request(v: serde_json::Value) -> MonitorRequest {
    serde_json::from_value(v).unwrap()
}

#[tokio::test]
async fn test_healthy_endpoint_scores_full_marks() {
    let api = StubApi::spawn().await.unwrap();
    let req = request(json!({
        "endpoints": [api.url("/todo")],
        "expected_format": ["id", "userId"],
    }));

    let report = Monitor::default().run(&req).await.unwrap();
    let r = &report.results.endpoints[0];
    assert_eq!(r.status, EndpointStatus::Success);
    assert_eq!(r.http_status, Some(200));
    assert_eq!(r.score, 100);
    assert!(r.valid_format);
    assert!(r.missing_keys.is_empty());
    assert!(r.warnings.is_empty(), "{:?}", r.warnings);
    assert_eq!(report.overall_score, 100.0);
    assert_eq!(report.stats.successful, 1);
    assert_eq!(report.stats.failed, 0);
}

#[tokio::test]
async fn test_results_keep_request_order() {
    let api = StubApi::spawn().await.unwrap();
    let endpoints = vec![api.url("/slow/300"), api.url("/joke"), api.url("/status/500"), api.url("/list")];
    let req = request(json!({"endpoints": endpoints, "expected_format": ["value", "id"]}));

    let report = Monitor::default().run(&req).await.unwrap();
    let got: Vec<&str> = report.results.endpoints.iter().map(|r| r.endpoint.as_str()).collect();
    assert_eq!(got, endpoints.iter().map(String::as_str).collect::<Vec<_>>());
    assert_eq!(report.stats.total_endpoints, 4);
    assert_eq!(report.stats.failed, 1);
}

#[tokio::test]
async fn test_server_error_and_client_error() {
    let api = StubApi::spawn().await.unwrap();
    let req = request(json!({"endpoints": [api.url("/status/500"), api.url("/status/404")]}));

    let report = Monitor::default().run(&req).await.unwrap();
    let [server, client] = &report.results.endpoints[..] else {
        panic!("expected two results");
    };
    assert_eq!(server.status, EndpointStatus::ServerError);
    assert_eq!(server.score, 30);
    assert_eq!(server.error.as_deref(), Some("HTTP 500"));
    assert_eq!(client.status, EndpointStatus::ClientError);
    assert_eq!(client.http_status, Some(404));
}

#[tokio::test]
async fn test_body_read_stops_at_limit() {
    let api = StubApi::spawn().await.unwrap();
    let req = request(json!({"endpoints": [api.url("/todo")], "expected_format": ["id"]}));
    let monitor = Monitor::new(MonitorSettings { max_body_bytes: 16, ..Default::default() });

    let report = monitor.run(&req).await.unwrap();
    let r = &report.results.endpoints[0];
    assert_eq!(r.status, EndpointStatus::Success);
    // The first 16 bytes are not a complete JSON document
    assert!(!r.valid_format);
    assert_eq!(r.score, 70);
    assert_eq!(r.warnings, vec!["Response body truncated at 16 bytes".to_string()]);

    // A body that fits is read whole
    let report = Monitor::new(MonitorSettings { max_body_bytes: 4096, ..Default::default() }).run(&req).await.unwrap();
    assert_eq!(report.results.endpoints[0].score, 100);
}

#[tokio::test]
async fn test_non_json_body_warns() {
    let api = StubApi::spawn().await.unwrap();
    let req = request(json!({"endpoints": [api.url("/text")], "expected_format": ["id"]}));

    let report = Monitor::default().run(&req).await.unwrap();
    let r = &report.results.endpoints[0];
    assert_eq!(r.status, EndpointStatus::Success);
    assert!(!r.valid_format);
    assert_eq!(r.score, 70);
    assert!(r.warnings.iter().any(|w| w.starts_with("Unexpected content type")));
}

#[tokio::test]
async fn test_missing_keys_partial_credit() {
    let api = StubApi::spawn().await.unwrap();
    let req = request(json!({"endpoints": [api.url("/todo")], "expected_format": ["value"]}));

    let report = Monitor::default().run(&req).await.unwrap();
    let r = &report.results.endpoints[0];
    assert!(!r.valid_format);
    assert_eq!(r.missing_keys, vec!["value"]);
    assert_eq!(r.score, 80);
    assert!(r.warnings.iter().any(|w| w.contains("Missing expected keys: value")));
}

#[tokio::test]
async fn test_timeout_scores_zero() {
    let api = StubApi::spawn().await.unwrap();
    let req = request(json!({"endpoints": [api.url("/slow/2500")], "timeout": 1}));

    let report = Monitor::default().run(&req).await.unwrap();
    let r = &report.results.endpoints[0];
    assert_eq!(r.status, EndpointStatus::Timeout);
    assert_eq!(r.score, 0);
    assert_eq!(r.http_status, None);
    assert!(r.error.as_deref().unwrap_or_default().contains("Timed out"));
    assert_eq!(report.stats.avg_response_time, None);
}

#[tokio::test]
async fn test_connection_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let req = request(json!({"endpoints": [format!("http://{addr}/gone")]}));
    let report = Monitor::default().run(&req).await.unwrap();
    let r = &report.results.endpoints[0];
    assert_eq!(r.status, EndpointStatus::ConnectionError);
    assert_eq!(r.score, 0);
    assert_eq!(report.overall_score, 0.0);
}

#[tokio::test]
async fn test_redirects() {
    let api = StubApi::spawn().await.unwrap();

    let followed = request(json!({"endpoints": [api.url("/redirect")]}));
    let report = Monitor::default().run(&followed).await.unwrap();
    let r = &report.results.endpoints[0];
    assert_eq!(r.status, EndpointStatus::Success);
    assert!(r.warnings.iter().any(|w| w.starts_with("Redirected to")));

    let not_followed = request(json!({"endpoints": [api.url("/redirect")], "follow_redirects": false}));
    let report = Monitor::default().run(&not_followed).await.unwrap();
    let r = &report.results.endpoints[0];
    assert_eq!(r.status, EndpointStatus::Redirect);
    assert_eq!(r.http_status, Some(307));
    assert_eq!(r.score, 50);
}

#[tokio::test]
async fn test_auth_headers_are_sent() {
    let api = StubApi::spawn().await.unwrap();
    let monitor = Monitor::default();

    let bearer = request(json!({
        "endpoints": [api.url("/auth/bearer")],
        "auth": {"auth_type": "bearer", "bearer_token": STUB_BEARER_TOKEN},
    }));
    assert_eq!(monitor.run(&bearer).await.unwrap().results.endpoints[0].http_status, Some(200));

    let key = request(json!({
        "endpoints": [api.url("/auth/key")],
        "auth": {"auth_type": "api_key", "api_key": STUB_API_KEY},
    }));
    assert_eq!(monitor.run(&key).await.unwrap().results.endpoints[0].http_status, Some(200));

    let basic = request(json!({
        "endpoints": [api.url("/auth/basic")],
        "auth": {"auth_type": "basic", "username": "user", "password": "pass"},
    }));
    assert_eq!(monitor.run(&basic).await.unwrap().results.endpoints[0].http_status, Some(200));

    let anonymous = request(json!({"endpoints": [api.url("/auth/basic")]}));
    assert_eq!(monitor.run(&anonymous).await.unwrap().results.endpoints[0].http_status, Some(401));
}

#[tokio::test]
async fn test_disabled_tls_validation_warns() {
    let api = StubApi::spawn().await.unwrap();
    let req = request(json!({"endpoints": [api.url("/todo")], "validate_ssl": false}));

    let report = Monitor::default().run(&req).await.unwrap();
    assert!(report.results.endpoints[0].warnings.iter().any(|w| w.contains("TLS")));
}

#[tokio::test]
async fn test_invalid_request_is_rejected_before_probing() {
    let req = request(json!({"endpoints": ["not-a-url"]}));
    let err = Monitor::default().run(&req).await.unwrap_err();
    assert!(err.to_string().contains("Invalid URLs: not-a-url"));

    let settings = MonitorSettings { max_endpoints: 1, ..Default::default() };
    let req = request(json!({"endpoints": ["https://a.io", "https://b.io"]}));
    assert!(Monitor::new(settings).run(&req).await.is_err());
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_public_apis() {
    let req = request(json!({
        "endpoints": [
            "https://jsonplaceholder.typicode.com/todos/1",
            "https://api.chucknorris.io/jokes/random",
        ],
        "expected_format": ["value", "id", "userId"],
    }));
    let report = Monitor::default().run(&req).await.unwrap();
    println!("{}", serde_json::to_string_pretty(&report).unwrap());
    assert_eq!(report.stats.total_endpoints, 2);
}
