use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use cloudlet_orchestrator::RequestContext;
use serde_json::{json, Value};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is alive"))
)]
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "cloudlet-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses((status = 200, description = "Readiness including backend reachability"))
)]
pub async fn readiness_check(State(state): State<AppState>) -> Json<Value> {
    // Inventory listing is the cheapest read the backend offers
    let backend_ok = state
        .backend()
        .list_compute_nodes(&RequestContext::new("cloudlet-api"))
        .await
        .is_ok();

    Json(json!({
        "status": if backend_ok { "ready" } else { "not_ready" },
        "service": "cloudlet-api",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": if backend_ok { "connected" } else { "disconnected" }
    }))
}
