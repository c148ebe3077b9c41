/// GitLab integration endpoints
///
/// The OAuth handshake itself happens outside this API; what arrives here is
/// its product, an access token. Linking stores the token together with the
/// remote user id it resolves to, which is what issue-assignee resolution
/// matches against on import.
///
/// # Endpoints
///
/// - `POST   /v1/gitlab/link` - Store an access token + resolved remote id
/// - `DELETE /v1/gitlab/link` - Clear the stored token
/// - `GET    /v1/gitlab/user` - Remote profile passthrough
/// - `GET    /v1/gitlab/projects` - Project name list (id + name)
/// - `GET    /v1/gitlab/projects/:projectId/issues` - Issue summaries
/// - `POST   /v1/gitlab/projects/:projectId/import` - Import all issues
/// - `POST   /v1/gitlab/projects/:projectId/issues/:issueIid/import` -
///   Import one issue by iid
///
/// All import endpoints require the acting user to have linked GitLab,
/// otherwise they fail with 401 "GitLab not linked". Re-importing is
/// idempotent: task ids derive from the remote issue id, and the upsert
/// keeps `creator`/`createdAt` from the first import.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use collabmate_shared::auth::middleware::AuthContext;
use collabmate_shared::gitlab::import;
use collabmate_shared::gitlab::types::{IssueSummary, Project, RemoteUser};
use collabmate_shared::models::task::Task;
use collabmate_shared::models::user::User;
use serde::{Deserialize, Serialize};

/// Link request: the access token produced by the OAuth handshake
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRequest {
    pub access_token: String,
}

/// Link response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    pub message: String,
    pub gitlab_user_id: i64,
}

/// Plain outcome message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Project list response
#[derive(Debug, Serialize)]
pub struct ProjectsResponse {
    pub projects: Vec<Project>,
}

/// Import response (bulk)
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub message: String,
    pub tasks: Vec<Task>,
}

/// Import response (single issue)
#[derive(Debug, Serialize)]
pub struct SingleImportResponse {
    pub message: String,
    pub task: Task,
}

/// Links the acting user's GitLab account
///
/// Resolves the token to the remote user and stores both the token and the
/// remote id on the user record.
pub async fn link(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<LinkRequest>,
) -> ApiResult<Json<LinkResponse>> {
    let remote = state.gitlab.current_user(&req.access_token).await?;
    User::link_gitlab(&state.store, &auth.user_id, &req.access_token, remote.id).await?;

    Ok(Json(LinkResponse {
        message: "GitLab linked".to_string(),
        gitlab_user_id: remote.id,
    }))
}

/// Clears the acting user's stored GitLab token
pub async fn unlink(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MessageResponse>> {
    User::unlink_gitlab(&state.store, &auth.user_id).await?;
    Ok(Json(MessageResponse {
        message: "GitLab unlinked successfully".to_string(),
    }))
}

/// Fetches the remote profile for the acting user's stored token
pub async fn remote_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<RemoteUser>> {
    let access_token = import::linked_access_token(&state.store, &auth.user_id).await?;
    Ok(Json(state.gitlab.current_user(&access_token).await?))
}

/// Lists the remote projects the acting user is a member of
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProjectsResponse>> {
    let access_token = import::linked_access_token(&state.store, &auth.user_id).await?;
    let projects = state.gitlab.list_projects(&access_token).await?;
    Ok(Json(ProjectsResponse { projects }))
}

/// Lists a project's issues as summaries (id, title, state, iid)
pub async fn list_issues(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Vec<IssueSummary>>> {
    let access_token = import::linked_access_token(&state.store, &auth.user_id).await?;
    let issues = state.gitlab.list_issues(&access_token, &project_id).await?;
    Ok(Json(issues.iter().map(IssueSummary::from).collect()))
}

/// Imports every issue of a project as local tasks
pub async fn import_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<ImportResponse>> {
    let tasks = import::import_project_issues(
        &state.store,
        state.gitlab.as_ref(),
        &auth.user_id,
        &project_id,
    )
    .await?;

    Ok(Json(ImportResponse {
        message: "GitLab issues converted to tasks".to_string(),
        tasks,
    }))
}

/// Imports one issue by its project-scoped iid
pub async fn import_single_issue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, issue_iid)): Path<(String, i64)>,
) -> ApiResult<(StatusCode, Json<SingleImportResponse>)> {
    let task = import::import_issue(
        &state.store,
        state.gitlab.as_ref(),
        &auth.user_id,
        &project_id,
        issue_iid,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(SingleImportResponse {
            message: "Issue imported as task".to_string(),
            task,
        }),
    ))
}
