//! The signed-URL gateway.
//!
//! Any request that no other route claims lands here. It must carry a valid
//! `sig`/`exp` pair for its exact path and query; the cleaned request is then
//! forwarded to the target mounted at the path's prefix.

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderMap},
    response::Response,
};

use crate::error::ApiError;
use crate::server::AppState;
use crate::services::UpstreamRequest;

pub async fn handle_gateway(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let verified = state.signer.verify(path_and_query, state.clock.now())?;
    tracing::debug!(
        kind = %state.signer.kind(),
        exp = verified.expires_at(),
        path = %verified.path(),
        "Token accepted"
    );
    let forward = verified.forward_path()?;
    let (path, query) = match forward.split_once('?') {
        Some((path, query)) => (path, Some(query.to_string())),
        None => (forward.as_str(), None),
    };

    let (target, rest) = state.routes.resolve(path).ok_or_else(|| {
        tracing::debug!(path = %path, "No target for signed path");
        ApiError::NotFound
    })?;

    let body = read_body(&parts.headers, body, state.config.max_body_bytes).await?;

    state
        .proxy
        .forward(
            target,
            UpstreamRequest {
                method: parts.method,
                rest: rest.to_string(),
                query,
                headers: parts.headers,
                body,
            },
        )
        .await
}

/// Buffer a request body, refusing anything over `limit` bytes.
pub(crate) async fn read_body(
    headers: &HeaderMap,
    body: Body,
    limit: usize,
) -> Result<Bytes, ApiError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(ApiError::PayloadTooLarge);
    }

    axum::body::to_bytes(body, limit).await.map_err(|e| {
        tracing::debug!(error = %e, "Failed to read request body");
        ApiError::PayloadTooLarge
    })
}
