//! Test utilities for integration tests.
//!
//! Provides:
//! - A router over an in-memory store and a temp-dir blob store
//! - Request helpers for JSON and multipart bodies
//! - Response decoding helpers

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use course_cms::blob::{LocalBlobStore, MediaKind};
use course_cms::store::MemoryStore;
use course_cms::{create_router, AppState, RouterConfig};

/// Boundary used for every multipart body built here.
pub const BOUNDARY: &str = "course-cms-test-boundary";

// =============================================================================
// Test Application
// =============================================================================

/// A router plus handles on everything behind it.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub dir: TempDir,
}

/// A decoded response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Body parsed as JSON, or `Value::Null` if it is not JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(RouterConfig::new(), |blobs| blobs)
    }

    /// App with a custom router configuration (tracing stays off).
    pub fn with_config(config: RouterConfig) -> Self {
        Self::build(config, |blobs| blobs)
    }

    /// App whose blob store caps `kind` at `bytes`.
    pub fn with_blob_limit(kind: MediaKind, bytes: u64) -> Self {
        Self::build(RouterConfig::new(), |blobs| blobs.with_limit(kind, bytes))
    }

    fn build(config: RouterConfig, blobs: impl FnOnce(LocalBlobStore) -> LocalBlobStore) -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let blobs = blobs(LocalBlobStore::new(
            dir.path().join("uploads"),
            dir.path().join("ebooks"),
        ));
        let state = AppState::new(store.clone(), Arc::new(blobs));
        let router = create_router(state, config.with_tracing(false));

        Self { router, store, dir }
    }

    pub fn video_dir(&self) -> PathBuf {
        self.dir.path().join("uploads")
    }

    pub fn pdf_dir(&self) -> PathBuf {
        self.dir.path().join("ebooks")
    }

    /// Send a request through a clone of the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        send_to(self.router.clone(), request).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn send_json(&self, method: Method, uri: &str, body: Value) -> TestResponse {
        self.send(json_request(method, uri, &body)).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.send_json(Method::POST, uri, body).await
    }

    pub async fn put_json(&self, uri: &str, body: Value) -> TestResponse {
        self.send_json(Method::PUT, uri, body).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Upload `content` as a single file field.
    pub async fn upload(
        &self,
        uri: &str,
        field: &str,
        file_name: &str,
        content: &[u8],
    ) -> TestResponse {
        self.send(multipart_request(uri, &[(field, file_name, content)]))
            .await
    }

    /// Create a document and return its hex id.
    pub async fn create(&self, collection: &str, body: Value) -> String {
        let response = self.post_json(&format!("/{}", collection), body).await;
        assert!(
            response.status.is_success(),
            "create in {} failed: {} {}",
            collection,
            response.status,
            response.text()
        );
        let json = response.json();
        json.get("insertedId")
            .or_else(|| json.get("result").and_then(|r| r.get("insertedId")))
            .and_then(Value::as_str)
            .expect("insertedId in create response")
            .to_string()
    }
}

// =============================================================================
// Request Builders
// =============================================================================

pub async fn send_to(router: Router, request: Request<Body>) -> TestResponse {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

/// Build a `multipart/form-data` request with one part per
/// `(field, file_name, content)`.
pub fn multipart_request(uri: &str, parts: &[(&str, &str, &[u8])]) -> Request<Body> {
    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

/// Encode `parts` as a multipart body. An empty file name leaves out the
/// `filename` parameter, making the part a plain form value.
pub fn multipart_body(parts: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, file_name, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        let disposition = if file_name.is_empty() {
            format!("Content-Disposition: form-data; name=\"{}\"\r\n", field)
        } else {
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, file_name
            )
        };
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Number of regular files directly inside `dir` (0 if it does not exist).
pub fn file_count(dir: &std::path::Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .filter(|e| e.path().is_file())
            .count(),
        Err(_) => 0,
    }
}

/// Deterministic test payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
