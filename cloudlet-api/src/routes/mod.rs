pub mod health;
pub mod instances;

use crate::{api_docs::ApiDoc, auth::context_middleware, state::AppState};
use axum::{middleware, routing::get, Json, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(health::routes()) // Health routes don't need a caller identity
        .route("/api-docs/openapi.json", get(openapi_spec))
        .merge(instances::routes().layer(middleware::from_fn(context_middleware)))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
