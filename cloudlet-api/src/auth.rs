use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use cloudlet_orchestrator::RequestContext;

fn header(req: &Request, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| req.headers().get(*name))
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Builds the [`RequestContext`] every backend call carries.
///
/// Identity is established upstream (keystone or an auth proxy); this layer
/// only reads the headers it sets. Requests without a user get 401.
pub async fn context_middleware(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let user = header(&req, &["x-user", "x-forwarded-user"]).ok_or(StatusCode::UNAUTHORIZED)?;

    let ctx = RequestContext {
        user,
        project_id: header(&req, &["x-project-id", "x-tenant-id"]),
        auth_token: header(&req, &["x-auth-token"]),
    };

    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}
