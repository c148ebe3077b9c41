/// JWT token generation and validation
///
/// Tokens are signed with HS256 and carry the user's identity plus the
/// `tokenVersion` the user record had at issue time. Verifying a token for a
/// user therefore has two steps: the signature/expiry/issuer checks done by
/// [`validate_token`], and the version comparison done by
/// [`validate_for_user`]. Bumping a user's `tokenVersion` (email or password
/// change) invalidates every token issued before the bump.
///
/// # Example
///
/// ```
/// use collabmate_shared::auth::jwt::{create_token, validate_token, Claims};
/// use collabmate_shared::models::user::User;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user = User::new("alice", "alice@example.com", "hash");
/// let token = create_token(&Claims::new(&user), "secret-key-of-at-least-32-bytes!")?;
///
/// let claims = validate_token(&token, "secret-key-of-at-least-32-bytes!")?;
/// assert_eq!(claims.sub, user.user_id);
/// # Ok(())
/// # }
/// ```

use crate::models::user::User;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Issuer claim stamped into every token
const ISSUER: &str = "collabmate";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was issued against an older `tokenVersion`
    #[error("Token expired or user not found, please login again")]
    Stale,
}

/// JWT claims structure
///
/// Standard claims (`sub`, `iss`, `iat`, `exp`) plus the identity fields the
/// frontend reads out of the token and the `token_version` staleness anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: String,

    /// Issuer - always "collabmate"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Display name at issue time
    pub username: String,

    /// Email at issue time
    pub email: String,

    /// The user's `tokenVersion` at issue time
    #[serde(default)]
    pub token_version: u32,
}

impl Claims {
    /// Creates claims for `user` with the default 7-day expiration
    pub fn new(user: &User) -> Self {
        Self::with_expiration(user, Duration::days(7))
    }

    /// Creates claims for `user` with a custom expiration
    pub fn with_expiration(user: &User, expires_in: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user.user_id.clone(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            username: user.username.clone(),
            email: user.email.clone(),
            token_version: user.token_version,
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Creates a signed JWT from claims
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT and extracts its claims
///
/// Verifies the signature, expiration, and issuer. Does **not** check the
/// stored `tokenVersion`; callers that have the user record at hand must
/// follow up with [`validate_for_user`].
///
/// # Errors
///
/// `JwtError::Expired` for an expired token, `JwtError::ValidationError`
/// for anything else wrong with it.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Checks that the claims still match the user's current credential state
///
/// Fails with `JwtError::Stale` when the embedded `token_version` no longer
/// equals the user's stored `tokenVersion`, i.e. the email or password
/// changed after the token was issued.
pub fn validate_for_user(claims: &Claims, user: &User) -> Result<(), JwtError> {
    if claims.sub != user.user_id || claims.token_version != user.token_version {
        return Err(JwtError::Stale);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn test_user() -> User {
        User::new("alice", "alice@example.com", "hash")
    }

    #[test]
    fn test_create_and_validate_token() {
        let user = test_user();
        let token = create_token(&Claims::new(&user), SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.sub, user.user_id);
        assert_eq!(validated.username, "alice");
        assert_eq!(validated.email, "alice@example.com");
        assert_eq!(validated.iss, "collabmate");
        assert_eq!(validated.token_version, 0);
        assert!(!validated.is_expired());
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let token = create_token(&Claims::new(&test_user()), "secret1").unwrap();
        assert!(validate_token(&token, "wrong-secret").is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        let user = test_user();
        let claims = Claims::with_expiration(&user, Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).unwrap();
        let result = validate_token(&token, SECRET);

        assert!(matches!(result.unwrap_err(), JwtError::Expired));
    }

    #[test]
    fn test_version_bump_invalidates_old_token() {
        let mut user = test_user();

        let old_claims = Claims::new(&user);
        let old_token = create_token(&old_claims, SECRET).unwrap();

        // Simulate a password change.
        user.token_version += 1;

        let decoded = validate_token(&old_token, SECRET).unwrap();
        assert!(matches!(
            validate_for_user(&decoded, &user).unwrap_err(),
            JwtError::Stale
        ));

        // A token issued after the bump passes.
        let new_token = create_token(&Claims::new(&user), SECRET).unwrap();
        let decoded = validate_token(&new_token, SECRET).unwrap();
        assert!(validate_for_user(&decoded, &user).is_ok());
    }

    #[test]
    fn test_validate_for_user_checks_subject() {
        let user = test_user();
        let other = test_user();

        let claims = Claims::new(&user);
        assert!(matches!(
            validate_for_user(&claims, &other).unwrap_err(),
            JwtError::Stale
        ));
    }
}
