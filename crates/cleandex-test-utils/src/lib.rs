//! Shared testing utilities for the Cleandex workspace.
//!
//! - CSV and JSON dataset fixtures
//! - [`StubApi`], a small JSON API served on an ephemeral local port

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

// ── Dataset fixtures ──────────────────────────────────────────────────────────

/// Complete, duplicate-free dataset.
pub const CLEAN_CSV: &str = "\
id,name,city,age,active
1,Ana,Lisbon,34,true
2,Bruno,Porto,28,false
3,Carla,Lisbon,45,true
4,Diogo,Faro,51,true
5,Eva,Porto,39,false
";

/// Dataset with missing cells, a duplicate row, a constant column and mixed types.
pub const MESSY_CSV: &str = "\
id,name,score,country,joined
1,Ana,10,PT,2024-01-05
2,,n/a,PT,2024-02-11
3,Carla,abc,PT,
3,Carla,abc,PT,
5,Eva,,PT,2024-03-30
";

/// Record-oriented JSON, as produced by `DataFrame.to_json(orient="records")`.
pub fn sample_records() -> Value {
    json!([
        {"userId": 1, "id": 1, "title": "delectus aut autem", "completed": false},
        {"userId": 1, "id": 2, "title": "quis ut nam facilis", "completed": false},
        {"userId": 2, "id": 3, "title": "fugiat veniam minus", "completed": true},
    ])
}

/// Column-oriented JSON, as accepted by `DataFrame(dict)`.
pub fn sample_columns() -> Value {
    json!({
        "product": ["apple", "pear", "apple", null],
        "price": [1.2, 0.8, 1.2, 2.5],
        "stock": [10, 0, 10, 3],
    })
}

// ── Stub API ──────────────────────────────────────────────────────────────────

pub const STUB_BEARER_TOKEN: &str = "stub-token";
pub const STUB_API_KEY: &str = "stub-key";
/// `user:pass`
pub const STUB_BASIC: &str = "Basic dXNlcjpwYXNz";

/// Local HTTP server with predictable JSON endpoints.
pub struct StubApi {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl StubApi {
    pub async fn spawn() -> anyhow::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, stub_router()).await {
                tracing::error!("stub api stopped: {e}");
            }
        });
        Ok(Self { addr, handle })
    }

    /// Absolute URL for a stub path (`/todo`, `/status/500`, …).
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for StubApi {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn stub_router() -> Router {
    Router::new()
        .route("/todo", get(|| async { Json(json!({"userId": 1, "id": 1, "title": "x", "completed": false})) }))
        .route("/joke", get(|| async { Json(json!({"id": "abc", "value": "Chuck Norris counted to infinity. Twice."})) }))
        .route("/records", get(|| async { Json(sample_records()) }))
        .route("/list", get(|| async { Json(json!([{"id": 1}, {"id": 2}])) }))
        .route("/text", get(|| async { "plain text body" }))
        .route("/slow/{ms}", get(slow))
        .route("/status/{code}", get(status))
        .route("/redirect", get(|| async { Redirect::temporary("/todo") }))
        .route("/auth/bearer", get(auth_bearer))
        .route("/auth/key", get(auth_key))
        .route("/auth/basic", get(auth_basic))
}

async fn slow(Path(ms): Path<u64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(json!({"id": 1, "slept_ms": ms}))
}

async fn status(Path(code): Path<u16>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"error": status.as_u16()}))).into_response()
}

fn guarded(headers: &HeaderMap, name: header::HeaderName, expected: &str) -> Response {
    match headers.get(name).and_then(|v| v.to_str().ok()) {
        Some(v) if v == expected => Json(json!({"id": 7, "authenticated": true})).into_response(),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"}))).into_response(),
    }
}

async fn auth_bearer(headers: HeaderMap) -> Response {
    guarded(&headers, header::AUTHORIZATION, &format!("Bearer {STUB_BEARER_TOKEN}"))
}

async fn auth_key(headers: HeaderMap) -> Response {
    guarded(&headers, header::HeaderName::from_static("x-api-key"), STUB_API_KEY)
}

async fn auth_basic(headers: HeaderMap) -> Response {
    guarded(&headers, header::AUTHORIZATION, STUB_BASIC)
}
