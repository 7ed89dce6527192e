//! Assertion helpers for tests.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use super::app::TestResponse;

/// Assert response has expected status code
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status, expected,
        "Expected status {}, got {}. Body: {}",
        expected,
        response.status,
        response.text()
    );
}

/// Assert response is OK (200)
pub fn assert_ok(response: &TestResponse) {
    assert_status(response, StatusCode::OK);
}

/// Assert the gateway's JSON error body: `{"status": <code>, "error": <message>}`
pub fn assert_error(response: &TestResponse, expected: StatusCode, message: &str) {
    assert_status(response, expected);
    let json: serde_json::Value = response.json();
    assert_eq!(
        json,
        serde_json::json!({ "status": expected.as_u16(), "error": message })
    );
}

/// Assert a 401 that reveals nothing about why
pub fn assert_unauthorized(response: &TestResponse) {
    assert_error(response, StatusCode::UNAUTHORIZED, "Unauthorized");
}

/// Assert the response may not be cached
pub fn assert_no_store(response: &TestResponse) {
    assert_eq!(response.header("cache-control"), Some("no-store"));
}
