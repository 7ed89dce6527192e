//! Mock HTTP server standing in for an internal target.

use std::time::Duration;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, Request, ResponseTemplate,
};

/// Wrapper around wiremock MockServer with convenience methods
pub struct MockHttpServer {
    pub server: MockServer,
}

impl MockHttpServer {
    /// Start a new mock HTTP server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Get the base URL of the mock server
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Mock a simple GET endpoint returning JSON
    pub async fn mock_get_json(&self, endpoint: &str, response: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(response)
                    .insert_header("content-type", "application/json"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock a GET endpoint with a query parameter
    pub async fn mock_get_with_param(
        &self,
        endpoint: &str,
        param_name: &str,
        param_value: &str,
        response: serde_json::Value,
    ) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .and(query_param(param_name, param_value))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(response)
                    .insert_header("content-type", "application/json"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock an endpoint answering any method with a custom response
    pub async fn mock_any(&self, endpoint: &str, response: ResponseTemplate) {
        Mock::given(path(endpoint))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Mock a GET endpoint that answers only after `delay`
    pub async fn mock_slow(&self, endpoint: &str, delay: Duration) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_delay(delay))
            .mount(&self.server)
            .await;
    }

    /// Mock an endpoint that returns an error
    pub async fn mock_error(&self, endpoint: &str, status: u16, message: &str) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_string(message))
            .mount(&self.server)
            .await;
    }

    /// Requests the target has seen so far
    pub async fn received(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// The only request the target has seen
    pub async fn single_request(&self) -> Request {
        let mut requests = self.received().await;
        assert_eq!(requests.len(), 1, "Expected exactly one upstream request");
        requests.remove(0)
    }
}
