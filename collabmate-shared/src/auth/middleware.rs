/// Authenticated-request context
///
/// After the HTTP layer verifies a bearer token (signature, expiry, and the
/// stored `tokenVersion` match), it inserts an [`AuthContext`] into the
/// request extensions so handlers know who is acting.

use serde::{Deserialize, Serialize};

/// Error type for credential extraction and verification
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header present
    #[error("Missing token")]
    MissingCredentials,

    /// Authorization header is not a Bearer token
    #[error("{0}")]
    InvalidFormat(String),

    /// Token failed signature/expiry/issuer validation
    #[error("{0}")]
    InvalidToken(String),

    /// Token was valid but no longer matches the user's credential state
    #[error("Token expired or user not found, please login again")]
    Stale,
}

/// Identity attached to an authenticated request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// The verified acting user's id
    pub user_id: String,
}

impl AuthContext {
    /// Creates a context for a verified user id
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}
