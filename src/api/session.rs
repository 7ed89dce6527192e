use axum::http::HeaderMap;
use capability_token::EdgeClaims;

use super::headers::HeaderMapExt;
use crate::error::ApiError;
use crate::server::AppState;

/// Authenticate the caller through the session cookie minted by the login
/// service. Any failure is a plain 401.
pub fn require_session(state: &AppState, headers: &HeaderMap) -> Result<EdgeClaims, ApiError> {
    let token = headers
        .cookie(&state.config.session_cookie)
        .ok_or(ApiError::Unauthorized)?;
    Ok(state.sessions.verify(token, state.clock.now())?)
}
