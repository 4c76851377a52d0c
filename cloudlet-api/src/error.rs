use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cloudlet_orchestrator::error::{BackendError, OrchestratorError};
use serde_json::json;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unavailable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::InvalidArgument(msg) => ApiError::BadRequest(msg),
            OrchestratorError::NotFound(_) => ApiError::NotFound("Server not found".to_string()),
            OrchestratorError::Cancelled => ApiError::Unavailable("Request cancelled".to_string()),
            OrchestratorError::Backend(e) => {
                error!("Backend call failed: {}", e);
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        OrchestratorError::Backend(err).into()
    }
}
