use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};
use cloudlet_orchestrator::{ActionOutcome, CloudletAction, RequestContext};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/instances", post(create_instance))
        .route("/api/v1/instances/{id}/action", post(instance_action))
}

/// Create an instance through the backend and decorate the response with
/// synthesis or handoff details requested via metadata.
#[utoipa::path(
    post,
    path = "/api/v1/instances",
    tag = "instances",
    responses(
        (status = 202, description = "Instance accepted; may carry `synthesis` or `handoff` keys"),
        (status = 400, description = "Body has no server object"),
    )
)]
pub async fn create_instance(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if !body.get("server").is_some_and(Value::is_object) {
        return Err(ApiError::BadRequest(
            "Unable to parse server in request body".to_string(),
        ));
    }

    let mut representation = state.backend().create_instance(&ctx, &body).await?;

    // Dropping the request future cancels any placement wait still running.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    state
        .augmenter
        .augment(&ctx, &body, &mut representation, &cancel)
        .await;

    Ok((StatusCode::ACCEPTED, Json(representation)))
}

#[utoipa::path(
    post,
    path = "/api/v1/instances/{id}/action",
    tag = "cloudlet",
    params(("id" = String, Path, description = "Instance identifier")),
    request_body = CloudletAction,
    responses(
        (status = 201, description = "Base VM captured", body = cloudlet_orchestrator::BaseImage),
        (status = 200, description = "Overlay finished (`overlay-id`) or handoff started (`handoff`)"),
        (status = 400, description = "Invalid action payload"),
        (status = 404, description = "Instance not found"),
    )
)]
pub async fn instance_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<CloudletAction>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(action) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    info!("{} requested on {} by {}", action.name(), id, ctx.user);

    let response = match state.orchestrator.perform(&ctx, &id, action).await? {
        ActionOutcome::BaseCaptured(image) => (StatusCode::CREATED, Json(image)).into_response(),
        ActionOutcome::OverlayFinished(overlay) => (StatusCode::OK, Json(overlay)).into_response(),
        ActionOutcome::HandoffStarted(handoff) => (StatusCode::OK, Json(handoff)).into_response(),
    };

    Ok(response)
}
