//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::error;

use crate::web::auth::SESSION_COOKIE;
use crate::web::state::AppState;

/// Middleware that verifies the session token cookie and loads the caller.
///
/// If valid, inserts the user (without the password hash) into request
/// extensions for handlers to use. If invalid or missing, returns 401
/// Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract cookie header
    let cookie_header = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Parse the token from the cookie
    let token = cookie_header
        .split(';')
        .find_map(|c| c.trim().strip_prefix(SESSION_COOKIE).and_then(|rest| rest.strip_prefix('=')))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 3. Verify signature and expiry
    let user_id = state
        .tokens
        .verify(token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    // 4. Load the user the token refers to
    let user = state.db.get_user_by_id(user_id).await.map_err(|e| {
        error!("Failed to load user for valid token: {:?}", e);
        StatusCode::UNAUTHORIZED
    })?;

    // 5. Attach the user and continue to the handler
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
