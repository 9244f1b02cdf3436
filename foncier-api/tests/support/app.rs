#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use foncier_api::{create_api_router, ApiConfig, StoreKind};
use foncier_storage::{MemoryStore, RegistryStore};
use serde_json::Value as JsonValue;
use tower::ServiceExt;
use uuid::Uuid;

pub const MULTIPART_BOUNDARY: &str = "foncier-test-boundary";

/// Fresh upload root under the system temp directory.
pub fn temp_upload_dir() -> PathBuf {
    std::env::temp_dir().join(format!("foncier-uploads-{}", Uuid::now_v7()))
}

pub fn test_config(seed_enabled: bool) -> ApiConfig {
    ApiConfig {
        upload_dir: temp_upload_dir(),
        seed_enabled,
        store: StoreKind::Memory,
        ..ApiConfig::default()
    }
}

/// Full router over an empty in-memory store.
pub fn test_app() -> (Router, Arc<MemoryStore>) {
    test_app_with(test_config(true))
}

pub fn test_app_with(config: ApiConfig) -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let dyn_store: Arc<dyn RegistryStore> = store.clone();
    (create_api_router(dyn_store, &config), store)
}

/// Send a request and decode the body as JSON (`Null` when empty).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, JsonValue) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| JsonValue::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub fn json_request(method: &str, uri: &str, body: &JsonValue) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, JsonValue) {
    send(app, get(uri)).await
}

pub async fn post_json(app: &Router, uri: &str, body: &JsonValue) -> (StatusCode, JsonValue) {
    send(app, json_request("POST", uri, body)).await
}

pub async fn put_json(app: &Router, uri: &str, body: &JsonValue) -> (StatusCode, JsonValue) {
    send(app, json_request("PUT", uri, body)).await
}

/// Register a parcel through the API and return its id.
pub async fn create_parcel(app: &Router, body: &JsonValue) -> String {
    let (status, parcel) = post_json(app, "/api/parcels", body).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", parcel);
    parcel["id"].as_str().expect("parcel id").to_string()
}

/// A `multipart/form-data` body; files are `(name, content_type, bytes)`.
pub fn multipart_body(files: &[(&str, &str, &[u8])], types: &[&str]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, content_type, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                MULTIPART_BOUNDARY, name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    for doc_type in types {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"types\"\r\n\r\n{}\r\n",
                MULTIPART_BOUNDARY, doc_type
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
        )
        .body(Body::from(body))
        .expect("Failed to build request")
}
