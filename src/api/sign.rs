use axum::{
    extract::{RawQuery, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Json},
};
use serde::Serialize;
use utoipa::ToSchema;

use super::session::require_session;
use crate::error::ApiError;
use crate::server::AppState;

/// Query parameter naming the internal path to sign
const PATH_PARAM: &str = "path";

/// Response from the /tunnel/sign endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct SignResponse {
    /// Absolute signed URL, valid until `exp`
    pub url: String,
    /// Expiry in unix seconds
    pub exp: i64,
}

/// Sign a tunnel URL
///
/// Every query parameter other than `path` is carried into the signed URL in
/// the order given. The caller must hold a valid session cookie.
#[utoipa::path(
    get,
    path = "/tunnel/sign",
    responses(
        (status = 200, description = "Signed URL issued", body = SignResponse),
        (status = 400, description = "Missing or malformed path"),
        (status = 401, description = "No valid session"),
    ),
    params(
        ("path" = String, Query, description = "Internal path starting with '/' (e.g. '/photon/api')"),
    ),
    tag = "Tunnel"
)]
pub async fn handle_sign(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let session = require_session(&state, &headers)?;

    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query.as_deref().unwrap_or(""))
        .map_err(|_| ApiError::InvalidInput("malformed query string".to_string()))?;

    let mut path = None;
    let mut params = Vec::with_capacity(pairs.len());
    for (name, value) in pairs {
        if name == PATH_PARAM {
            if path.replace(value).is_some() {
                return Err(ApiError::InvalidInput("path given more than once".to_string()));
            }
        } else {
            params.push((name, value));
        }
    }
    let path = path.ok_or_else(|| ApiError::InvalidInput("missing path".to_string()))?;

    let signed = state
        .signer
        .sign(&path, params, state.config.default_ttl, state.clock.now())?;

    tracing::info!(
        sub = %session.sub,
        path = %path,
        exp = signed.exp,
        "Signed tunnel URL"
    );

    Ok((
        [(header::CACHE_CONTROL, "no-store")],
        Json(SignResponse {
            url: signed.url,
            exp: signed.exp,
        }),
    ))
}
