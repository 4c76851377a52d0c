//! Common test utilities and helpers for cloudlet-api tests
//!
//! Every test app runs against a [`ScriptedBackend`] with a short placement
//! interval so the handoff path does not slow the suite down.

#![allow(dead_code)]

use axum::Router;
use cloudlet_orchestrator::{test_utils::ScriptedBackend, PlacementPolicy};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

pub const TEST_HANDOFF_PORT: u16 = 8022;

pub fn fast_policy() -> PlacementPolicy {
    PlacementPolicy {
        interval: Duration::from_millis(1),
        max_attempts: 30,
    }
}

/// Create a test app wired to the given backend
pub fn create_test_app(backend: Arc<ScriptedBackend>) -> Router {
    let state = cloudlet_api::AppState::with_settings(backend, fast_policy(), TEST_HANDOFF_PORT);
    cloudlet_api::create_app(state)
}

/// Fixture: backend holding one instance already placed on `compute-1`
pub fn fixture_backend_with_instance(id: &str) -> Arc<ScriptedBackend> {
    let backend = Arc::new(ScriptedBackend::new());
    backend.add_placed_instance(id, "compute-1");
    backend.add_node("compute-1", Some("10.0.0.5"));
    backend
}

/// Create body for a server carrying the given metadata
pub fn server_request(metadata: Value) -> Value {
    json!({
        "server": {
            "name": "cloudlet-vm",
            "imageRef": "base-image",
            "flavorRef": "1",
            "metadata": metadata
        }
    })
}

/// Helper to extract JSON body from axum response
pub async fn extract_json_body<T>(response: axum::response::Response) -> T
where
    T: serde::de::DeserializeOwned,
{
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");

    serde_json::from_slice(&body).expect("Failed to deserialize JSON")
}

/// Helper to create authenticated request headers
pub fn auth_headers(username: &str) -> Vec<(&'static str, &str)> {
    vec![("x-user", username), ("x-project-id", "demo")]
}

/// TestClient to encapsulate API interaction logic
pub struct TestClient {
    pub app: Router,
    pub backend: Arc<ScriptedBackend>,
}

impl TestClient {
    pub fn new(backend: Arc<ScriptedBackend>) -> Self {
        let app = create_test_app(backend.clone());
        Self { app, backend }
    }

    /// Client over a backend holding a single placed instance
    pub fn with_instance(id: &str) -> Self {
        Self::new(fixture_backend_with_instance(id))
    }

    /// Send a request to the API
    pub async fn send_request(
        &self,
        request: axum::http::Request<axum::body::Body>,
    ) -> axum::http::Response<axum::body::Body> {
        use tower::ServiceExt;
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Post raw bytes to an endpoint
    pub async fn post_raw(
        &self,
        uri: &str,
        body: impl Into<axum::body::Body>,
        headers: Option<Vec<(&str, &str)>>,
    ) -> axum::http::Response<axum::body::Body> {
        let mut builder = axum::http::Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");

        if let Some(h) = headers {
            for (k, v) in h {
                builder = builder.header(k, v);
            }
        }

        let request = builder.body(body.into()).unwrap();
        self.send_request(request).await
    }

    /// Post JSON to an endpoint
    pub async fn post<T: serde::Serialize>(
        &self,
        uri: &str,
        body: &T,
        headers: Option<Vec<(&str, &str)>>,
    ) -> axum::http::Response<axum::body::Body> {
        let req_body = serde_json::to_string(body).expect("Failed to serialize request body");
        self.post_raw(uri, req_body, headers).await
    }

    /// Post a server action as `alice`
    pub async fn action(&self, id: &str, body: Value) -> axum::http::Response<axum::body::Body> {
        self.post(
            &format!("/api/v1/instances/{id}/action"),
            &body,
            Some(auth_headers("alice")),
        )
        .await
    }

    /// Get request to an endpoint
    pub async fn get(
        &self,
        uri: &str,
        headers: Option<Vec<(&str, &str)>>,
    ) -> axum::http::Response<axum::body::Body> {
        let mut builder = axum::http::Request::builder().method("GET").uri(uri);

        if let Some(h) = headers {
            for (k, v) in h {
                builder = builder.header(k, v);
            }
        }

        let request = builder.body(axum::body::Body::empty()).unwrap();
        self.send_request(request).await
    }
}
