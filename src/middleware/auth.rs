// ABOUTME: Session authentication middleware for protected routes
// ABOUTME: Resolves the session cookie to a SessionContext request extension

use crate::context::ServerResources;
use crate::errors::AppError;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::debug;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session_token";

/// Extract a cookie value from the request headers
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Require a live session. Resolves the session cookie through the session
/// store and injects the [`crate::auth::SessionContext`] as a request
/// extension; absence yields the 401 envelope with the login boundary as
/// redirect hint rather than a hard failure.
pub async fn require_session(
    State(resources): State<Arc<ServerResources>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = get_cookie_value(request.headers(), SESSION_COOKIE) else {
        debug!("protected route without session cookie: {}", request.uri().path());
        return AppError::auth_required().into_response();
    };

    let Some(context) = resources.sessions.get(&token) else {
        debug!("stale or revoked session token on {}", request.uri().path());
        return AppError::auth_required().into_response();
    };

    request.extensions_mut().insert(context);
    next.run(request).await
}
