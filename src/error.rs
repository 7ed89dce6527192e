use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use capability_token::TokenError;
use serde_json::json;
use thiserror::Error;

/// Errors returned by request handlers.
///
/// The `Display` text of a variant is what the client sees, so variants that
/// wrap internal detail render a generic message and keep the detail for logs.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Bad gateway")]
    UpstreamUnavailable,

    #[error("Internal error")]
    Internal(String),
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        if e.is_client_input() {
            ApiError::InvalidInput(e.to_string())
        } else if let TokenError::Encoding(detail) = e {
            ApiError::Internal(detail)
        } else {
            // The reason stays in the logs; the caller only learns "Unauthorized"
            tracing::debug!(reason = %e, "Token rejected");
            ApiError::Unauthorized
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Internal(detail) = &self {
            tracing::error!(%detail, "Internal error");
        }

        let body = Json(json!({
            "status": status.as_u16(),
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
