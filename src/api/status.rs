use axum::{extract::State, response::Json};
use serde_json::{Map, Value};

use crate::server::AppState;
use crate::services::{probe_targets, PROBE_TIMEOUT};

/// Reachability of internal targets
///
/// Each configured target is reported as "up" or "down" by name, plus
/// `"tunnel": "ok"` for the gateway itself.
#[utoipa::path(
    get,
    path = "/status",
    responses(
        (status = 200, description = "Target reachability, e.g. {\"photon\":\"up\",\"otp\":\"down\",\"tunnel\":\"ok\"}"),
    ),
    tag = "Status"
)]
pub async fn handle_status(State(state): State<AppState>) -> Json<Value> {
    let statuses = probe_targets(state.routes.targets(), PROBE_TIMEOUT).await;

    let mut body = Map::new();
    for (name, status) in statuses {
        tracing::debug!(upstream = %name, status = ?status, "Probed target");
        body.insert(name, serde_json::json!(status));
    }
    body.insert("tunnel".to_string(), Value::from("ok"));

    Json(Value::Object(body))
}
