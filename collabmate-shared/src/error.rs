/// Common error taxonomy for core operations
///
/// Every fallible operation in this crate returns one of these kinds.
/// They are terminal for the current request: nothing here is retried
/// internally, and the HTTP layer maps each kind to a status code.
///
/// # Kinds
///
/// - `InvalidInput`: missing or malformed request fields, always caller-fixable
/// - `NotFound`: a referenced entity does not exist
/// - `Unauthorized`: missing/invalid/stale credential, or GitLab link absent
/// - `InvalidState`: the operation is not valid for the current relationships
///   (e.g. "User not in team")
/// - `RemoteFailure`: the external issue tracker errored or was unreachable
/// - `Storage` / `Internal`: infrastructure failures outside the request-level
///   taxonomy

use crate::auth::password::PasswordError;
use crate::gitlab::source::GitLabError;
use crate::store::StoreError;

/// Core result type alias
pub type CoreResult<T> = Result<T, CoreError>;

/// Unified error type for the core engines
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Missing or malformed request fields
    #[error("{0}")]
    InvalidInput(String),

    /// Referenced entity absent
    #[error("{0}")]
    NotFound(String),

    /// Missing, invalid, or stale credential
    #[error("{0}")]
    Unauthorized(String),

    /// Operation not valid given current relationships
    #[error("{0}")]
    InvalidState(String),

    /// The remote issue-tracking service errored or was unreachable
    #[error("remote failure: {0}")]
    RemoteFailure(String),

    /// Record store failure
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// Internal failure outside the request-level taxonomy
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<GitLabError> for CoreError {
    fn from(err: GitLabError) -> Self {
        CoreError::RemoteFailure(err.to_string())
    }
}

impl From<PasswordError> for CoreError {
    fn from(err: PasswordError) -> Self {
        CoreError::Internal(format!("password operation failed: {}", err))
    }
}
