/// Dashboard endpoints
///
/// # Endpoints
///
/// - `GET /v1/dashboard/calendar` - Task deadlines for the calendar view
/// - `GET /v1/dashboard/summary` - Completed vs remaining totals
/// - `GET /v1/dashboard/tasks/:taskId/progress` - One task's progress percent

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDate;
use collabmate_shared::models::task::{Task, TaskStatus};
use serde::{Deserialize, Serialize};

/// Calendar feed entry
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub task_id: String,
    pub title: String,
    pub deadline: Option<NaiveDate>,
    pub status: TaskStatus,
}

/// Task totals
#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
}

/// One task's progress
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub task_id: String,
    pub title: String,
    pub status: TaskStatus,
    #[serde(rename = "progress_percent")]
    pub progress_percent: u8,
}

/// Task deadlines for the calendar view
pub async fn calendar(State(state): State<AppState>) -> ApiResult<Json<Vec<CalendarEntry>>> {
    let tasks = Task::all(&state.store).await?;
    let entries = tasks
        .into_iter()
        .map(|t| CalendarEntry {
            task_id: t.task_id,
            title: t.title,
            deadline: t.deadline,
            status: t.status,
        })
        .collect();
    Ok(Json(entries))
}

/// Total task summary: completed vs remaining
pub async fn summary(State(state): State<AppState>) -> ApiResult<Json<SummaryResponse>> {
    let tasks = Task::all(&state.store).await?;

    let total = tasks.len();
    let completed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Done)
        .count();

    Ok(Json(SummaryResponse {
        total,
        completed,
        remaining: total - completed,
    }))
}

/// Progress percent for one task: Done 100, In Progress 50, otherwise 0
pub async fn task_progress(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<ProgressResponse>> {
    let task = Task::find_by_id(&state.store, &task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let progress = match task.status {
        TaskStatus::Done => 100,
        TaskStatus::InProgress => 50,
        TaskStatus::ToDo => 0,
    };

    Ok(Json(ProgressResponse {
        task_id: task.task_id,
        title: task.title,
        status: task.status,
        progress_percent: progress,
    }))
}
