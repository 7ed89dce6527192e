//! Forwarding of verified requests to internal targets.
//!
//! Only a small allowlist of headers crosses the gateway in either
//! direction. Response bodies are streamed, never buffered.

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderName, Method},
    response::Response,
};
use std::time::Duration;

use crate::error::ApiError;
use crate::models::Target;

/// Caller headers passed to the internal target.
const FORWARDED_REQUEST_HEADERS: [HeaderName; 3] =
    [header::ACCEPT, header::ACCEPT_LANGUAGE, header::CONTENT_TYPE];

/// Target headers passed back to the caller.
const PRESERVED_RESPONSE_HEADERS: [HeaderName; 2] = [header::CONTENT_TYPE, header::CACHE_CONTROL];

/// A request ready to be re-issued upstream.
#[derive(Debug)]
pub struct UpstreamRequest {
    pub method: Method,
    /// Path with the target prefix stripped, e.g. "/api"
    pub rest: String,
    /// Query string without the leading '?'
    pub query: Option<String>,
    /// Headers of the original request
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub struct UpstreamProxy {
    client: reqwest::Client,
}

impl UpstreamProxy {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }

    /// Send `request` to `target` once and stream the answer back.
    ///
    /// Transport failures (refused connection, timeout, DNS) become
    /// [`ApiError::UpstreamUnavailable`]. HTTP error statuses from the target
    /// are passed through unchanged.
    pub async fn forward(
        &self,
        target: &Target,
        request: UpstreamRequest,
    ) -> Result<Response, ApiError> {
        let url = target.upstream_url(&request.rest, request.query.as_deref());

        let mut builder = self.client.request(request.method.clone(), &url);
        for name in FORWARDED_REQUEST_HEADERS.iter() {
            if let Some(value) = request.headers.get(name) {
                builder = builder.header(name.clone(), value.clone());
            }
        }
        for (name, value) in &target.headers {
            builder = builder.header(name.clone(), value.clone());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        tracing::debug!(
            upstream = %target.name,
            method = %request.method,
            path = %request.rest,
            "Forwarding request"
        );

        let upstream = builder.send().await.map_err(|e| {
            tracing::warn!(
                upstream = %target.name,
                timeout = e.is_timeout(),
                connect = e.is_connect(),
                error = %e,
                "Upstream request failed"
            );
            ApiError::UpstreamUnavailable
        })?;

        let status = upstream.status();
        let mut response = Response::builder().status(status);
        for name in PRESERVED_RESPONSE_HEADERS.iter() {
            if let Some(value) = upstream.headers().get(name) {
                response = response.header(name.clone(), value.clone());
            }
        }

        tracing::debug!(upstream = %target.name, status = status.as_u16(), "Upstream responded");

        response
            .body(Body::from_stream(upstream.bytes_stream()))
            .map_err(|e| ApiError::Internal(format!("Failed to build proxied response: {e}")))
    }
}
