//! Bearer-token access to internal targets for edge clients.
//!
//! A logged-in browser trades its session for a short-lived edge token, then
//! calls `/edge/<prefix>/...` with `Authorization: Bearer <token>`. Unlike
//! signed URLs, an edge token covers every path and query until it expires.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Json, Response},
};
use capability_token::EdgeTokenCodec;
use serde::Serialize;
use utoipa::ToSchema;

use super::gateway::read_body;
use super::headers::HeaderMapExt;
use super::session::require_session;
use crate::error::ApiError;
use crate::server::AppState;
use crate::services::UpstreamRequest;

/// Path under which edge-proxied targets are mounted
pub const EDGE_MOUNT: &str = "/edge";

/// Response from the /edge/token endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct EdgeTokenResponse {
    pub token: String,
    /// Expiry in unix seconds
    pub exp: i64,
    /// Subject carried over from the session
    pub sub: String,
}

fn edge_codec(state: &AppState) -> Result<&EdgeTokenCodec, ApiError> {
    state.edge.as_deref().ok_or(ApiError::NotFound)
}

/// Issue an edge token
///
/// Exchanges a valid session cookie for a bearer token usable on
/// `/edge/...` routes. Returns 404 when edge tokens are not configured.
#[utoipa::path(
    get,
    path = "/edge/token",
    responses(
        (status = 200, description = "Edge token issued", body = EdgeTokenResponse),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Edge tokens are disabled"),
    ),
    tag = "Edge"
)]
pub async fn handle_edge_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let codec = edge_codec(&state)?;
    let session = require_session(&state, &headers)?;

    let issued = codec.issue(&session.sub, state.config.default_ttl, state.clock.now())?;

    tracing::info!(sub = %session.sub, exp = issued.exp, "Issued edge token");

    Ok((
        [(header::CACHE_CONTROL, "no-store")],
        Json(EdgeTokenResponse {
            token: issued.token,
            exp: issued.exp,
            sub: session.sub,
        }),
    ))
}

/// Forward a bearer-authenticated request to the target under `/edge`.
pub async fn handle_edge_proxy(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, ApiError> {
    let codec = edge_codec(&state)?;
    let (parts, body) = request.into_parts();

    let token = parts.headers.bearer_token().ok_or(ApiError::Unauthorized)?;
    let claims = codec.verify(token, state.clock.now())?;

    let path = parts
        .uri
        .path()
        .strip_prefix(EDGE_MOUNT)
        .ok_or(ApiError::NotFound)?;
    let (target, rest) = state.routes.resolve(path).ok_or(ApiError::NotFound)?;

    tracing::debug!(
        kind = %codec.kind(),
        sub = %claims.sub,
        upstream = %target.name,
        "Edge request"
    );

    let body = read_body(&parts.headers, body, state.config.max_body_bytes).await?;
    let mut response = state
        .proxy
        .forward(
            target,
            UpstreamRequest {
                method: parts.method,
                rest: rest.to_string(),
                query: parts.uri.query().map(str::to_string),
                headers: parts.headers,
                body,
            },
        )
        .await?;

    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}
