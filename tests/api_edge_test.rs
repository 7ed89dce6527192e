//! Integration tests for edge tokens and the /edge proxy.

mod common;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use common::fixtures::{self, NOW};
use common::{assert_error, assert_no_store, assert_ok, assert_unauthorized, MockHttpServer, TestApp};

#[tokio::test]
async fn test_edge_token_requires_session() {
    let app = TestApp::new();

    let response = app.get("/edge/token").await;

    assert_unauthorized(&response);
}

#[tokio::test]
async fn test_edge_token_issued_for_session() {
    let app = TestApp::new();
    let cookie = app.session_cookie("alice");

    let response = app.get_with_headers("/edge/token", &[("cookie", &cookie)]).await;

    assert_ok(&response);
    assert_no_store(&response);
    let json: serde_json::Value = response.json();
    assert_eq!(json["sub"], "alice");
    assert_eq!(json["exp"], NOW + 120);
    assert_eq!(json["token"].as_str().unwrap().split('.').count(), 2);
}

#[tokio::test]
async fn test_edge_proxy_forwards_with_bearer() {
    let upstream = MockHttpServer::start().await;
    upstream
        .mock_get_with_param("/api", "q", "park", json!({"features": [1]}))
        .await;
    let app = TestApp::with_upstream(&upstream);
    let cookie = app.session_cookie("alice");
    let issued: serde_json::Value = app
        .get_with_headers("/edge/token", &[("cookie", &cookie)])
        .await
        .json();
    let bearer = format!("Bearer {}", issued["token"].as_str().unwrap());

    let response = app
        .get_with_headers("/edge/photon/api?q=park&limit=3", &[("authorization", &bearer)])
        .await;

    assert_ok(&response);
    assert_no_store(&response);
    assert_eq!(response.json::<serde_json::Value>(), json!({"features": [1]}));

    let request = upstream.single_request().await;
    assert_eq!(request.url.path(), "/api");
    assert_eq!(request.url.query(), Some("q=park&limit=3"));
    assert!(request.headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_edge_proxy_requires_bearer() {
    let upstream = MockHttpServer::start().await;
    let app = TestApp::with_upstream(&upstream);

    let response = app.get("/edge/photon/api?q=park").await;

    assert_unauthorized(&response);
    assert!(upstream.received().await.is_empty());
}

#[tokio::test]
async fn test_edge_proxy_rejects_garbage_token() {
    let app = TestApp::new();

    for bearer in ["Bearer nope", "Bearer a.b", "Bearer a.b.c", "Basic YTpi"] {
        let response = app
            .get_with_headers("/edge/photon/api", &[("authorization", bearer)])
            .await;
        assert_unauthorized(&response);
    }
}

#[tokio::test]
async fn test_session_token_is_not_an_edge_token() {
    let app = TestApp::new();
    let cookie = app.session_cookie("alice");
    let session_token = cookie.strip_prefix("session=").unwrap();
    let bearer = format!("Bearer {session_token}");

    let response = app
        .get_with_headers("/edge/photon/api", &[("authorization", &bearer)])
        .await;

    assert_unauthorized(&response);
}

#[tokio::test]
async fn test_edge_token_expires() {
    let upstream = MockHttpServer::start().await;
    upstream.mock_get_json("/api", json!({})).await;
    let app = TestApp::with_upstream(&upstream);
    let bearer = app.edge_bearer("alice");

    app.clock.advance(120);
    let response = app
        .get_with_headers("/edge/photon/api", &[("authorization", &bearer)])
        .await;
    assert_ok(&response);

    app.clock.advance(1);
    let response = app
        .get_with_headers("/edge/photon/api", &[("authorization", &bearer)])
        .await;
    assert_unauthorized(&response);
}

#[tokio::test]
async fn test_edge_unknown_prefix() {
    let app = TestApp::new();
    let bearer = app.edge_bearer("alice");

    let response = app
        .get_with_headers("/edge/nominatim/search", &[("authorization", &bearer)])
        .await;

    assert_error(&response, StatusCode::NOT_FOUND, "Not found");
}

#[tokio::test]
async fn test_edge_routes_disabled_without_secret() {
    let mut secrets = fixtures::test_secrets();
    secrets.edge = None;
    let app = TestApp::with_config(
        fixtures::test_config(fixtures::DEAD_URL, fixtures::DEAD_URL),
        secrets,
    );
    let cookie = app.session_cookie("alice");

    let response = app.get_with_headers("/edge/token", &[("cookie", &cookie)]).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .get_with_headers("/edge/photon/api", &[("authorization", &app.edge_bearer("alice"))])
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
