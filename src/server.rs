//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    routing::{any, get},
    Router,
};
use capability_token::{EdgeTokenCodec, UrlSigner};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::api::{self, CorsLayer, CorsPolicy};
use crate::error::ApiError;
use crate::models::{AppConfig, RouteTable, Secrets};
use crate::services::{Clock, UpstreamProxy};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub signer: Arc<UrlSigner>,
    /// Verifies session cookies
    pub sessions: Arc<EdgeTokenCodec>,
    /// Issues and verifies edge bearer tokens, when configured
    pub edge: Option<Arc<EdgeTokenCodec>>,
    pub routes: Arc<RouteTable>,
    pub proxy: Arc<UpstreamProxy>,
    pub clock: Arc<dyn Clock>,
}

/// Create application state from configuration and secrets.
pub fn create_app_state(
    config: AppConfig,
    secrets: Secrets,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<AppState> {
    config.validate()?;

    let routes = RouteTable::from_config(&config.targets)?;
    let proxy = UpstreamProxy::new(Duration::from_secs(config.upstream_timeout_secs))
        .map_err(|e| anyhow::anyhow!("Failed to create upstream client: {e}"))?;
    let signer = UrlSigner::new(secrets.tunnel, config.public_origin.clone());
    let sessions = EdgeTokenCodec::new(secrets.session);
    let edge = secrets.edge.map(|secret| Arc::new(EdgeTokenCodec::new(secret)));

    if edge.is_none() {
        tracing::warn!("EDGE_TOKEN_SECRET not set, edge routes are disabled");
    }
    for target in routes.targets() {
        tracing::info!(
            upstream = %target.name,
            prefix = %target.prefix,
            base_url = %target.base_url,
            "Target mounted"
        );
    }

    Ok(AppState {
        config: Arc::new(config),
        signer: Arc::new(signer),
        sessions: Arc::new(sessions),
        edge,
        routes: Arc::new(routes),
        proxy: Arc::new(proxy),
        clock,
    })
}

/// Build the API router with all endpoints and middleware.
///
/// Requests not matched by a named route fall through to the signed-URL
/// gateway. CORS wraps everything, so `OPTIONS` never reaches a handler.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new(CorsPolicy::from_config(&state.config.cors));

    Router::new()
        // URL signing for logged-in users
        .route(
            "/tunnel/sign",
            get(api::handle_sign).fallback(method_not_allowed),
        )
        // Edge bearer tokens
        .route(
            "/edge/token",
            get(api::handle_edge_token).fallback(method_not_allowed),
        )
        .route("/edge/*rest", any(api::handle_edge_proxy))
        // Reachability and health
        .route("/status", get(api::handle_status).fallback(method_not_allowed))
        .route("/health", get(|| async { "OK" }))
        // Everything else must carry a signature
        .fallback(api::handle_gateway)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
