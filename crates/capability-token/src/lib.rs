//! capability-token: HMAC-SHA256 capability tokens
//!
//! Two token kinds share one set of primitives (HMAC-SHA256, unpadded
//! base64url, constant-time comparison) and differ only in what string the
//! HMAC covers:
//!
//! - [`TokenKind::SignedUrl`]: a path plus query parameters plus `exp`,
//!   carried as `sig`/`exp` URL parameters. See [`UrlSigner`].
//! - [`TokenKind::Edge`]: a base64url JSON payload `{sub, exp}` followed by
//!   `.` and its signature, carried as a bearer token. See [`EdgeTokenCodec`].
//!
//! Nothing here reads the clock. Every operation that depends on time takes
//! the current unix time as `now`, which keeps signing and verification pure.
//!
//! ```
//! use capability_token::{Secret, UrlSigner};
//!
//! let signer = UrlSigner::new(Secret::from("s3cret"), "https://tunnel.example.org");
//! let params = vec![("q".to_string(), "park".to_string())];
//! let signed = signer.sign("/photon/api", params, 120, 1000).unwrap();
//! assert_eq!(signed.exp, 1120);
//!
//! let path_and_query = signed.url.strip_prefix("https://tunnel.example.org").unwrap();
//! let verified = signer.verify(path_and_query, 1100).unwrap();
//! assert_eq!(verified.forward_path().unwrap(), "/photon/api?q=park");
//! ```

pub mod edge;
pub mod error;
pub mod primitives;
pub mod signed_url;
pub mod token;

pub use edge::{EdgeClaims, EdgeTokenCodec, IssuedEdgeToken};
pub use error::TokenError;
pub use primitives::{constant_time_eq, Secret};
pub use signed_url::{
    SignedRequest, SignedUrl, UrlSigner, VerifiedRequest, DEFAULT_TTL_SECS, EXP_PARAM, SIG_PARAM,
};
pub use token::{CapabilityToken, TokenKind};
