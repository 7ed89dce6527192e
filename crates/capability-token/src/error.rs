use thiserror::Error;

/// Why a token could not be produced or accepted.
///
/// The variants carry the internal reason for logging. Callers facing the
/// network must collapse every authentication failure into one generic
/// response (see [`TokenError::is_client_input`]).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("path must start with '/'")]
    InvalidPath,

    #[error("parameter name '{0}' is reserved")]
    ReservedParam(String),

    #[error("ttl must be a positive number of seconds")]
    InvalidTtl,

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("duplicate field: {0}")]
    DuplicateField(&'static str),

    #[error("expiry is not an integer")]
    InvalidExpiry,

    #[error("token expired at {expires_at} (now {now})")]
    Expired { expires_at: i64, now: i64 },

    #[error("signature mismatch")]
    BadSignature,

    #[error("malformed token: {0}")]
    Malformed(&'static str),

    #[error("encoding error: {0}")]
    Encoding(String),
}

impl TokenError {
    /// True for errors caused by a bad signing request rather than a failed
    /// verification.
    pub fn is_client_input(&self) -> bool {
        matches!(
            self,
            TokenError::InvalidPath | TokenError::ReservedParam(_) | TokenError::InvalidTtl
        )
    }
}
