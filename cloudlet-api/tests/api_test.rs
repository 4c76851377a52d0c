//! Integration tests for REST API endpoints
//!
//! Exercises the cloudlet server actions and the instance create path
//! against a scripted compute backend.

mod common;

use axum::http::StatusCode;
use cloudlet_orchestrator::test_utils::{CallCounts, ScriptedBackend};
use common::{auth_headers, extract_json_body, server_request, TestClient};
use serde_json::{json, Value};
use std::sync::Arc;

#[tokio::test]
async fn test_capture_base_returns_created() {
    let client = TestClient::with_instance("vm-1");

    let response = client
        .action("vm-1", json!({"cloudlet-base": {"name": "golden"}}))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = extract_json_body(response).await;
    assert_eq!(body["base-disk"]["name"], "golden-disk");
    assert_eq!(body["base-memory"]["name"], "golden-mem");
    assert_eq!(client.backend.base_names(), vec!["golden".to_string()]);
}

#[tokio::test]
async fn test_capture_base_without_name_is_rejected_before_lookup() {
    let client = TestClient::with_instance("vm-1");

    let response = client.action("vm-1", json!({"cloudlet-base": null})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = extract_json_body(response).await;
    assert_eq!(body["error"], "Name required for base VM.");
    assert_eq!(client.backend.calls(), CallCounts::default());
}

#[tokio::test]
async fn test_capture_base_unknown_instance_is_not_found() {
    let client = TestClient::with_instance("vm-1");

    let response = client
        .action("missing", json!({"cloudlet-base": {"name": "golden"}}))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = extract_json_body(response).await;
    assert_eq!(body["error"], "Server not found");
    assert_eq!(client.backend.calls().create_base, 0);
}

#[tokio::test]
async fn test_finish_overlay_returns_overlay_id() {
    let client = TestClient::with_instance("vm-1");

    let response = client
        .action("vm-1", json!({"cloudlet-overlay-finish": {"overlay-name": "ov1"}}))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = extract_json_body(response).await;
    assert_eq!(body, json!({"overlay-id": "overlay-vm-1-ov1"}));
}

#[tokio::test]
async fn test_finish_overlay_without_name_is_bad_request() {
    let client = TestClient::with_instance("vm-1");

    let response = client
        .action("vm-1", json!({"cloudlet-overlay-finish": {}}))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(client.backend.calls().create_overlay, 0);
}

#[tokio::test]
async fn test_http_handoff_without_token_is_rejected() {
    let client = TestClient::with_instance("vm-1");

    let response = client
        .action(
            "vm-1",
            json!({"cloudlet-handoff": {"handoff_url": "http://dest.example:8000"}}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = extract_json_body(response).await;
    assert_eq!(
        body["error"],
        "An auth token required to handoff to the destination."
    );
    assert_eq!(client.backend.calls(), CallCounts::default());
}

#[tokio::test]
async fn test_handoff_echoes_destination_url() {
    let client = TestClient::with_instance("vm-1");

    let response = client
        .action(
            "vm-1",
            json!({"cloudlet-handoff": {
                "handoff_url": "https://dest.example:8000/cloudlet",
                "dest_token": "secret",
                "dest_vmname": "migrated"
            }}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = extract_json_body(response).await;
    assert_eq!(body["handoff"], "https://dest.example:8000/cloudlet");

    let handoffs = client.backend.handoffs();
    assert_eq!(handoffs.len(), 1);
    assert_eq!(handoffs[0].instance_id, "vm-1");
    assert_eq!(handoffs[0].token.as_deref(), Some("secret"));
    assert_eq!(handoffs[0].vm_name.as_deref(), Some("migrated"));
}

#[tokio::test]
async fn test_handoff_returns_residue_when_backend_reports_one() {
    let client = TestClient::with_instance("vm-1");
    client.backend.set_residue(Some("residue-42"));

    let response = client
        .action(
            "vm-1",
            json!({"cloudlet-handoff": {"handoff_url": "file:///var/cloudlet/out"}}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = extract_json_body(response).await;
    assert_eq!(body["handoff"], "residue-42");
}

#[tokio::test]
async fn test_unknown_action_is_bad_request() {
    let client = TestClient::with_instance("vm-1");

    let response = client.action("vm-1", json!({"reboot": {"type": "HARD"}})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(client.backend.calls(), CallCounts::default());
}

#[tokio::test]
async fn test_malformed_action_body_is_bad_request() {
    let client = TestClient::with_instance("vm-1");

    let response = client
        .post_raw(
            "/api/v1/instances/vm-1/action",
            "{not json",
            Some(auth_headers("alice")),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_action_without_auth_fails() {
    let client = TestClient::with_instance("vm-1");

    let response = client
        .post(
            "/api/v1/instances/vm-1/action",
            &json!({"cloudlet-base": {"name": "golden"}}),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(client.backend.calls(), CallCounts::default());
}

#[tokio::test]
async fn test_backend_failure_is_internal_error() {
    let client = TestClient::with_instance("vm-1");
    client.backend.fail_operations("compute service unavailable");

    let response = client
        .action("vm-1", json!({"cloudlet-base": {"name": "golden"}}))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_create_plain_instance_is_not_augmented() {
    let client = TestClient::new(Arc::new(ScriptedBackend::new()));

    let response = client
        .post(
            "/api/v1/instances",
            &server_request(json!({})),
            Some(auth_headers("alice")),
        )
        .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body: Value = extract_json_body(response).await;
    assert_eq!(body["server"]["id"], "instance-0001");
    assert!(body.get("synthesis").is_none());
    assert!(body.get("handoff").is_none());
    assert_eq!(client.backend.calls().get_instance, 0);
}

#[tokio::test]
async fn test_create_with_overlay_url_reports_synthesis() {
    let client = TestClient::new(Arc::new(ScriptedBackend::new()));

    let response = client
        .post(
            "/api/v1/instances",
            &server_request(json!({"overlay_url": "http://overlays.example/ov1.zip"})),
            Some(auth_headers("alice")),
        )
        .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body: Value = extract_json_body(response).await;
    assert_eq!(body["synthesis"], json!({"return": "success"}));
    assert!(body.get("handoff").is_none());
}

#[tokio::test]
async fn test_create_with_handoff_info_reports_forwarded_port() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.place_new_instances_after(3, "compute-1");
    backend.add_node("compute-1", Some("10.0.0.5"));
    let client = TestClient::new(backend);

    let response = client
        .post(
            "/api/v1/instances",
            &server_request(json!({"handoff_info": "vm-1"})),
            Some(auth_headers("alice")),
        )
        .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body: Value = extract_json_body(response).await;
    assert_eq!(
        body["handoff"],
        json!({"server_ip": "192.168.1.10", "server_port": 40022})
    );
    assert_eq!(client.backend.calls().get_instance, 3);
    assert_eq!(
        client.backend.port_requests(),
        vec![("10.0.0.5".to_string(), common::TEST_HANDOFF_PORT)]
    );
}

#[tokio::test]
async fn test_create_with_unscheduled_instance_reports_error_object() {
    let client = TestClient::new(Arc::new(ScriptedBackend::new()));

    let response = client
        .post(
            "/api/v1/instances",
            &server_request(json!({"handoff_info": "vm-1"})),
            Some(auth_headers("alice")),
        )
        .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body: Value = extract_json_body(response).await;
    assert_eq!(
        body["handoff"],
        json!({"error": "cannot setup port forwarding"})
    );
    assert_eq!(client.backend.calls().get_instance, 30);
    assert_eq!(client.backend.calls().negotiate_port_forward, 0);
}

#[tokio::test]
async fn test_create_without_server_object_is_bad_request() {
    let client = TestClient::new(Arc::new(ScriptedBackend::new()));

    let response = client
        .post(
            "/api/v1/instances",
            &json!({"name": "no-wrapper"}),
            Some(auth_headers("alice")),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(client.backend.calls().create_instance, 0);
}

#[tokio::test]
async fn test_health_endpoints_need_no_auth() {
    let client = TestClient::new(Arc::new(ScriptedBackend::new()));

    let response = client.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = extract_json_body(response).await;
    assert_eq!(body["status"], "ok");

    let response = client.get("/health/ready", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = extract_json_body(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["backend"], "connected");
}

#[tokio::test]
async fn test_readiness_reports_unreachable_backend() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.fail_lookups("connection refused");
    let client = TestClient::new(backend);

    let response = client.get("/health/ready", None).await;

    let body: Value = extract_json_body(response).await;
    assert_eq!(body["status"], "not_ready");
    assert_eq!(body["backend"], "disconnected");
}

#[tokio::test]
async fn test_openapi_document_lists_action_endpoint() {
    let client = TestClient::new(Arc::new(ScriptedBackend::new()));

    let response = client.get("/api-docs/openapi.json", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = extract_json_body(response).await;
    assert!(body["paths"]
        .get("/api/v1/instances/{id}/action")
        .is_some());
}
