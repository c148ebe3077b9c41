/// User profile and presence endpoints
///
/// # Endpoints
///
/// - `GET    /v1/users/all` - List all users
/// - `GET    /v1/users/status/all` - Every user's presence status
/// - `GET    /v1/users/:userId/status` - One user's presence status
/// - `PATCH  /v1/users/:userId/status` - Set presence status
/// - `GET    /v1/users/:userId/profile` - Get profile
/// - `PATCH  /v1/users/:userId/profile` - Typed partial profile update
/// - `DELETE /v1/users/:userId` - Delete user (cascades into tasks/teams)

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    Json,
};
use collabmate_shared::models::user::{UpdateProfile, User, UserStatus, UserStatusEntry};
use serde::{Deserialize, Serialize};

/// Body for the status update
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: UserStatus,
}

/// Response for status reads and writes
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user_id: String,
    pub status: UserStatus,
}

/// Response wrapping a user profile
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user_id: String,
    pub profile: User,
}

/// Response for user deletion
#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub message: String,
    pub user: User,
}

/// Lists all users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(User::list(&state.store).await?))
}

/// Every user's presence status
pub async fn all_statuses(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<UserStatusEntry>>> {
    Ok(Json(User::all_statuses(&state.store).await?))
}

/// One user's presence status
pub async fn get_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let status = User::get_status(&state.store, &user_id).await?;
    Ok(Json(StatusResponse {
        message: None,
        user_id,
        status,
    }))
}

/// Sets a user's presence status
pub async fn set_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<SetStatusRequest>,
) -> ApiResult<Json<StatusResponse>> {
    User::set_status(&state.store, &user_id, req.status).await?;
    Ok(Json(StatusResponse {
        message: Some("Status updated".to_string()),
        user_id,
        status: req.status,
    }))
}

/// Gets a user's profile
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = User::find_by_id(&state.store, &user_id)
        .await?
        .ok_or_else(|| crate::error::ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(ProfileResponse {
        message: None,
        user_id,
        profile: user,
    }))
}

/// Applies a typed partial profile update
///
/// Only the enumerated mutable fields exist on the request body; an email or
/// password change bumps the user's `tokenVersion`, invalidating every token
/// issued before it (including the one used for this request).
pub async fn update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(changes): Json<UpdateProfile>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = User::update_profile(&state.store, &user_id, changes).await?;
    Ok(Json(ProfileResponse {
        message: Some("Profile updated".to_string()),
        user_id,
        profile: user,
    }))
}

/// Deletes a user
///
/// The user's id is removed from every task's assignee list and every team's
/// member list.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<DeleteUserResponse>> {
    let user = User::delete(&state.store, &user_id).await?;
    Ok(Json(DeleteUserResponse {
        message: "User deleted".to_string(),
        user,
    }))
}
