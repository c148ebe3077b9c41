/// Team membership and succession endpoints
///
/// # Endpoints
///
/// - `POST   /v1/teams` - Create a team (creator becomes sole member + admin)
/// - `PATCH  /v1/teams/:teamId/member` - Add a member (idempotent)
/// - `PATCH  /v1/teams/:teamId/role` - Assign a role to a member
/// - `GET    /v1/teams/:teamId` - Get a team
/// - `GET    /v1/teams/:teamId/members/detailed` - Members with their tasks
/// - `DELETE /v1/teams/:teamId` - Delete a team
/// - `POST   /v1/teams/:teamId/leave` - Leave; FIFO succession applies when
///   the administrator leaves, and the team dissolves when the administrator
///   was the last member

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use collabmate_shared::models::team::{Departure, MemberDetail, Team};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Create team request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    /// Team name
    #[validate(length(min = 1, max = 100, message = "Team name must be 1-100 characters"))]
    pub team_name: String,

    /// Creator's user id
    #[validate(length(min = 1, message = "Missing userId"))]
    pub user_id: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// Body naming a user (add member, leave)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRequest {
    pub user_id: String,
}

/// Assign role request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    pub user_id: String,
    pub role: String,
}

/// Response wrapping a team
#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub message: String,
    pub team: Team,
}

/// Response for role assignment
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleResponse {
    pub message: String,
    pub user_id: String,
    pub role: String,
}

/// Response for leaving; the team is present unless it dissolved
#[derive(Debug, Serialize)]
pub struct LeaveResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,
}

/// Creates a team
pub async fn create_team(
    State(state): State<AppState>,
    Json(req): Json<CreateTeamRequest>,
) -> ApiResult<(StatusCode, Json<TeamResponse>)> {
    req.validate().map_err(ApiError::from_validation)?;

    let team = Team::create(
        &state.store,
        &req.team_name,
        &req.user_id,
        req.description.as_deref().unwrap_or(""),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(TeamResponse {
            message: "Team created".to_string(),
            team,
        }),
    ))
}

/// Adds a user to a team (idempotent)
pub async fn add_member(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
    Json(req): Json<MemberRequest>,
) -> ApiResult<Json<TeamResponse>> {
    let team = Team::add_member(&state.store, &team_id, &req.user_id).await?;
    Ok(Json(TeamResponse {
        message: "Member added to team".to_string(),
        team,
    }))
}

/// Assigns a role to a team member
pub async fn assign_role(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
    Json(req): Json<AssignRoleRequest>,
) -> ApiResult<Json<AssignRoleResponse>> {
    Team::assign_role(&state.store, &team_id, &req.user_id, &req.role).await?;
    Ok(Json(AssignRoleResponse {
        message: "Role assigned".to_string(),
        user_id: req.user_id,
        role: req.role,
    }))
}

/// Gets a team by ID
pub async fn get_team(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> ApiResult<Json<Team>> {
    Ok(Json(Team::get(&state.store, &team_id).await?))
}

/// Detailed member listing: profile fields plus assigned tasks
pub async fn detailed_members(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> ApiResult<Json<Vec<MemberDetail>>> {
    Ok(Json(Team::detailed_members(&state.store, &team_id).await?))
}

/// Deletes a team, clearing members' `teamId`
pub async fn delete_team(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> ApiResult<Json<TeamResponse>> {
    let team = Team::delete(&state.store, &team_id).await?;
    Ok(Json(TeamResponse {
        message: "Team deleted".to_string(),
        team,
    }))
}

/// A user leaves the team
pub async fn leave_team(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
    Json(req): Json<MemberRequest>,
) -> ApiResult<Json<LeaveResponse>> {
    let response = match Team::leave(&state.store, &team_id, &req.user_id).await? {
        Departure::Remaining(team) => LeaveResponse {
            message: "User left the team".to_string(),
            team: Some(team),
        },
        Departure::Dissolved => LeaveResponse {
            message: "Administrator left, team deleted".to_string(),
            team: None,
        },
    };
    Ok(Json(response))
}
