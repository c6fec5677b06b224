use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::AppState;
use crate::auth::verify_token;
use crate::error::ApiError;

/// Extract and validate the bearer token, stashing the claims in request
/// extensions for handlers to pick up via `Extension<Claims>`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized("missing or invalid Authorization header"))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized("missing or invalid Authorization header"))?;

    let claims = verify_token(token, &state.jwt_secret)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
