//! Dashboard pages against an in-memory backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use cleandex_common::reliability::{DimensionScores, Grade, ReliabilityIndex};
use cleandex_dashboard::backend::{AnalysisOutcome, BackendError, BackendResult, CleandexBackend};
use cleandex_dashboard::router::build_router;
use cleandex_dashboard::state::DashboardState;
use cleandex_monitor::{MonitorReport, MonitorRequest};
use cleandex_profile::ReportEntry;
use cleandex_test_utils::{StubApi, CLEAN_CSV};

/// Records what the pages sent and answers with canned data.
#[derive(Default)]
struct FakeBackend {
    uploads: Mutex<Vec<(String, Vec<u8>)>>,
    dataframes: Mutex<Vec<Value>>,
    monitor_requests: Mutex<Vec<Value>>,
    reports: Vec<ReportEntry>,
}

fn outcome(link: &str) -> AnalysisOutcome {
    AnalysisOutcome {
        mensagem: "Análise concluída".to_string(),
        relatorio: link.to_string(),
        reliability: ReliabilityIndex {
            index: 87.5,
            grade: Grade::B,
            dimensions: DimensionScores { completeness: 0.9, uniqueness: 1.0, consistency: 0.8, validity: 0.75 },
        },
    }
}

#[async_trait]
impl CleandexBackend for FakeBackend {
    async fn analyze_csv(&self, file_name: &str, bytes: Vec<u8>) -> BackendResult<AnalysisOutcome> {
        self.uploads.lock().unwrap().push((file_name.to_string(), bytes));
        Ok(outcome(&format!("/baixar/{file_name}")))
    }

    async fn analyze_dataframe(&self, data: &Value) -> BackendResult<AnalysisOutcome> {
        self.dataframes.lock().unwrap().push(data.clone());
        Ok(outcome("/baixar/1700000000"))
    }

    async fn monitor(&self, request: &MonitorRequest) -> BackendResult<MonitorReport> {
        self.monitor_requests.lock().unwrap().push(serde_json::to_value(request).unwrap());
        Ok(sample_report())
    }

    async fn reports(&self) -> BackendResult<Vec<ReportEntry>> {
        Ok(self.reports.clone())
    }

    async fn download(&self, name: &str) -> BackendResult<Vec<u8>> {
        if name == "known.csv" {
            Ok(b"<html>report</html>".to_vec())
        } else {
            Err(BackendError::Rejected { status: 404, detail: "Arquivo não encontrado".to_string() })
        }
    }
}

/// Monitor report as the API would return it.
fn sample_report() -> MonitorReport {
    serde_json::from_value(json!({
        "run_id": "6f1c2a52-3f55-4a0e-9d59-0c7f6c2b9e10",
        "timestamp": "2026-01-02T03:04:05Z",
        "overall_score": 65.0,
        "stats": {"total_endpoints": 2, "successful": 1, "failed": 1, "avg_response_time": 0.12},
        "results": {"endpoints": [
            {"endpoint": "https://a.io/todos/1", "status": "success", "http_status": 200,
             "response_time": 0.1, "score": 100, "valid_format": true, "missing_keys": [],
             "error": null, "warnings": []},
            {"endpoint": "https://b.io/<script>", "status": "server_error", "http_status": 503,
             "response_time": 0.14, "score": 30, "valid_format": false, "missing_keys": ["id"],
             "error": "HTTP 503", "warnings": ["Slow response: 1.20s"]}
        ]}
    }))
    .unwrap()
}

fn app(backend: Arc<FakeBackend>) -> Router {
    let state = DashboardState::new(backend, Duration::from_secs(5)).unwrap();
    build_router(Arc::new(state))
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn text(resp: axum::response::Response) -> String {
    String::from_utf8(to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap()
}

#[tokio::test]
async fn test_index_has_both_forms() {
    let html = text(app(Arc::default()).oneshot(get("/")).await.unwrap()).await;
    assert!(html.contains(r#"action="/analyze/csv""#));
    assert!(html.contains(r#"action="/analyze/api""#));
    assert!(html.contains(r#"class="nav-link active" data-page="analyze""#));
}

#[tokio::test]
async fn test_csv_upload_is_forwarded() {
    let backend = Arc::new(FakeBackend::default());
    let boundary = "dash-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"people.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n{CLEAN_CSV}\r\n--{boundary}--\r\n"
    );
    let req = Request::post("/analyze/csv")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();

    let resp = app(backend.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = text(resp).await;
    assert!(html.contains("Análise concluída"));
    // Auto-escaping also encodes '/', which browsers decode in attributes
    assert!(html.contains(r#"href="&#x2f;baixar&#x2f;people.csv""#));
    assert!(html.contains("87.5"));

    let uploads = backend.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, "people.csv");
    assert_eq!(uploads[0].1, CLEAN_CSV.as_bytes());
}

#[tokio::test]
async fn test_api_source_is_fetched_and_analyzed() {
    let api = StubApi::spawn().await.unwrap();
    let backend = Arc::new(FakeBackend::default());
    let body = format!("url={}", api.url("/todo"));

    let html = text(app(backend.clone()).oneshot(form_post("/analyze/api", &body)).await.unwrap()).await;
    assert!(html.contains("Análise concluída"));

    // A single object is sent as one record
    let frames = backend.dataframes.lock().unwrap();
    assert_eq!(frames[0], json!([{"userId": 1, "id": 1, "title": "x", "completed": false}]));
}

#[tokio::test]
async fn test_api_source_rejects_bad_url() {
    let backend = Arc::new(FakeBackend::default());
    let html = text(app(backend.clone()).oneshot(form_post("/analyze/api", "url=javascript%3Aalert(1)")).await.unwrap()).await;
    assert!(html.contains("Invalid URL"));
    assert!(backend.dataframes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_results_without_run_shows_notice() {
    let html = text(app(Arc::default()).oneshot(get("/monitor/results")).await.unwrap()).await;
    assert!(html.contains("No monitoring data available"));
    assert!(html.contains(r#"href="/monitor""#));
}

#[tokio::test]
async fn test_monitor_submit_then_results() {
    let backend = Arc::new(FakeBackend::default());
    let app = app(backend.clone());

    let body = "endpoints=https%3A%2F%2Fa.io%2Ftodos%2F1%0D%0Ahttps%3A%2F%2Fb.io&expected_keys=id%2C+value\
                &timeout=7&auth_type=bearer&bearer_token=secret-token";
    let resp = app.clone().oneshot(form_post("/monitor", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/monitor/results");

    let sent = backend.monitor_requests.lock().unwrap()[0].clone();
    assert_eq!(sent["endpoints"], json!(["https://a.io/todos/1", "https://b.io"]));
    assert_eq!(sent["expected_format"], json!(["id", "value"]));
    assert_eq!(sent["timeout"], 7);
    assert_eq!(sent["auth"], json!({"auth_type": "bearer", "bearer_token": "secret-token"}));

    let html = text(app.oneshot(get("/monitor/results")).await.unwrap()).await;
    assert!(html.contains("65/100"));
    assert!(html.contains("server_error"));
    assert!(html.contains("Warning: Slow response: 1.20s"));
    assert!(html.contains("https:&#x2f;&#x2f;b.io&#x2f;&lt;script&gt;"));
    assert!(!html.contains("<script>"));
    assert!(!html.contains("secret-token"));
}

#[tokio::test]
async fn test_monitor_validation_error_keeps_input() {
    let backend = Arc::new(FakeBackend::default());
    let resp = app(backend.clone())
        .oneshot(form_post("/monitor", "endpoints=not-a-url&expected_keys=&timeout=10&auth_type=none"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = text(resp).await;
    assert!(html.contains("URLs inválidas: not-a-url"));
    assert!(html.contains(">not-a-url</textarea>"));
    assert!(backend.monitor_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_history_lists_reports() {
    let entry: ReportEntry = serde_json::from_value(json!({
        "name": "sales<2024>.csv",
        "download": "/baixar/sales<2024>.csv",
        "created_at": "2026-01-02T03:04:05Z",
        "size_bytes": 2048,
        "index": 91.2,
        "grade": "A",
        "title": "sales.csv"
    }))
    .unwrap();
    let backend = Arc::new(FakeBackend { reports: vec![entry], ..Default::default() });

    let html = text(app(backend).oneshot(get("/history")).await.unwrap()).await;
    assert!(html.contains("sales&lt;2024&gt;.csv"));
    assert!(html.contains("91.2"));
    assert!(html.contains("2.0 KB"));

    let empty = text(app(Arc::default()).oneshot(get("/history")).await.unwrap()).await;
    assert!(empty.contains("No reports yet"));
}

#[tokio::test]
async fn test_download_proxy() {
    let app = app(Arc::default());

    let resp = app.clone().oneshot(get("/baixar/known.csv")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"relatorio_known.csv.html\"; filename*=UTF-8''relatorio_known.csv.html"
    );

    let resp = app.oneshot(get("/baixar/missing.csv")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
