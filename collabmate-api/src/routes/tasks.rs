/// Task endpoints
///
/// # Endpoints
///
/// - `POST   /v1/tasks` - Create a task
/// - `GET    /v1/tasks` - List, with optional status/teamId/userId filters
/// - `GET    /v1/tasks/grouped?by=status|team` - Grouped listing
/// - `DELETE /v1/tasks/all` - Delete every task
/// - `PUT    /v1/tasks/:taskId` - Partial update
/// - `PATCH  /v1/tasks/:taskId/assign` - Assign a user (idempotent)
/// - `PATCH  /v1/tasks/:taskId/status` - Change status
/// - `DELETE /v1/tasks/:taskId` - Delete a task

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use collabmate_shared::models::task::{
    CreateTask, GroupBy, PurgeOutcome, Task, TaskFilter, TaskStatus, UpdateTask,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Title, required and non-empty
    #[validate(length(min = 1, message = "Missing required title"))]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Defaults to "To Do"
    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub deadline: Option<NaiveDate>,

    /// Assignees; an empty list is valid but the field itself is required
    pub user_ids: Vec<String>,

    /// Creator's user id
    #[validate(length(min = 1, message = "Missing userId"))]
    pub user_id: String,
}

/// Body naming the user to assign
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub user_id: String,
}

/// Body carrying the new status
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusRequest {
    pub new_status: TaskStatus,
}

/// Listing filters, all optional
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub team_id: Option<String>,
    pub user_id: Option<String>,
}

/// Grouping axis
#[derive(Debug, Deserialize)]
pub struct GroupQuery {
    pub by: Option<String>,
}

/// Response wrapping a task
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub message: String,
    pub task: Task,
}

/// Response wrapping a task list
#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub message: String,
    pub tasks: Vec<Task>,
}

/// Response for the grouped listing
#[derive(Debug, Serialize)]
pub struct GroupedResponse {
    pub groups: HashMap<String, Vec<Task>>,
}

/// Plain outcome message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Creates a task
pub async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    req.validate().map_err(ApiError::from_validation)?;

    let task = Task::create(
        &state.store,
        CreateTask {
            title: req.title,
            description: req.description.unwrap_or_default(),
            status: req.status,
            deadline: req.deadline,
            user_ids: req.user_ids,
            creator: req.user_id,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            message: "Task created".to_string(),
            task,
        }),
    ))
}

/// Lists tasks matching the optional filters
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
) -> ApiResult<Json<TaskListResponse>> {
    let tasks = Task::list(
        &state.store,
        TaskFilter {
            status: query.status,
            team_id: query.team_id,
            user_id: query.user_id,
        },
    )
    .await?;

    Ok(Json(TaskListResponse {
        message: "Tasks retrieved".to_string(),
        tasks,
    }))
}

/// Groups all tasks by status or by team
pub async fn grouped_tasks(
    State(state): State<AppState>,
    Query(query): Query<GroupQuery>,
) -> ApiResult<Json<GroupedResponse>> {
    let by = match query.by.as_deref() {
        Some("status") => GroupBy::Status,
        Some("team") => GroupBy::Team,
        _ => {
            return Err(ApiError::BadRequest(
                "Invalid grouping method. Use \"status\" or \"team\".".to_string(),
            ))
        }
    };

    let groups = Task::grouped(&state.store, by).await?;
    Ok(Json(GroupedResponse { groups }))
}

/// Applies a partial update
pub async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(changes): Json<UpdateTask>,
) -> ApiResult<Json<TaskResponse>> {
    let task = Task::update(&state.store, &task_id, changes).await?;
    Ok(Json(TaskResponse {
        message: "Task updated".to_string(),
        task,
    }))
}

/// Assigns a user to a task (idempotent)
pub async fn assign_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(req): Json<AssignRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let task = Task::assign_user(&state.store, &task_id, &req.user_id).await?;
    Ok(Json(TaskResponse {
        message: "User assigned to task".to_string(),
        task,
    }))
}

/// Changes a task's status
pub async fn change_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(req): Json<ChangeStatusRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let task = Task::change_status(&state.store, &task_id, req.new_status).await?;
    Ok(Json(TaskResponse {
        message: "Task status updated".to_string(),
        task,
    }))
}

/// Deletes a task, clearing stale user references to it
pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<TaskResponse>> {
    let task = Task::delete(&state.store, &task_id).await?;
    Ok(Json(TaskResponse {
        message: "Task deleted".to_string(),
        task,
    }))
}

/// Deletes every task
///
/// An already-empty collection is a distinct no-op success.
pub async fn delete_all_tasks(
    State(state): State<AppState>,
) -> ApiResult<Json<MessageResponse>> {
    let message = match Task::delete_all(&state.store).await? {
        PurgeOutcome::Nothing => "No tasks to delete",
        PurgeOutcome::Cleared(_) => "All tasks deleted",
    };
    Ok(Json(MessageResponse {
        message: message.to_string(),
    }))
}
