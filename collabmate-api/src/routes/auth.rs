/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user, returns a token
/// - `POST /v1/auth/login` - Login and get a token
///
/// Tokens are HS256 JWTs valid for 7 days, embedding the user's identity and
/// the `tokenVersion` current at issue time. Changing the email or password
/// later bumps the stored version and invalidates the token.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, http::StatusCode, Json};
use collabmate_shared::{
    auth::{jwt, password},
    models::user::User,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Username must be 1-100 characters"))]
    pub username: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (strength-checked separately)
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Response for both register and login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Outcome message
    pub message: String,

    /// User ID
    pub user_id: String,

    /// Signed JWT (7 days)
    pub token: String,
}

/// Register a new user
///
/// # Errors
///
/// - `422 Unprocessable Entity`: validation failed (email format, username
///   length, password strength)
/// - `409 Conflict`: email already exists
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate().map_err(ApiError::from_validation)?;

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message: e,
        }])
    })?;

    if User::find_by_email(&state.store, &req.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;
    let user = User::create(
        &state.store,
        User::new(req.username, req.email, password_hash),
    )
    .await?;

    let token = jwt::create_token(&jwt::Claims::new(&user), state.jwt_secret())?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered".to_string(),
            user_id: user.user_id,
            token,
        }),
    ))
}

/// Login an existing user
///
/// The same message is returned for an unknown email and a wrong password.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: validation failed
/// - `401 Unauthorized`: invalid credentials
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    let user = User::find_by_email(&state.store, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let token = jwt::create_token(&jwt::Claims::new(&user), state.jwt_secret())?;

    Ok(Json(AuthResponse {
        message: "User logged in".to_string(),
        user_id: user.user_id,
        token,
    }))
}
