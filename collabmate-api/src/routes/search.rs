/// Keyword search over tasks, users, and teams
///
/// `GET /v1/search?type=task|user|team&keyword=...` performs a case-insensitive
/// substring match over the fields the frontend surfaces for each type.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Search parameters; both are required
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub keyword: Option<String>,
}

/// Search handler
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Value>> {
    let (kind, keyword) = match (query.kind, query.keyword) {
        (Some(kind), Some(keyword)) => (kind, keyword),
        _ => {
            return Err(ApiError::BadRequest(
                "Missing required parameters (type, keyword)".to_string(),
            ))
        }
    };
    let kw = keyword.trim().to_lowercase();

    let result = match kind.as_str() {
        "task" => {
            let tasks = state.store.tasks.load().await?;
            let hits: Vec<_> = tasks
                .into_iter()
                .filter(|t| {
                    t.title.to_lowercase().contains(&kw)
                        || t.description.to_lowercase().contains(&kw)
                        || t.status.as_str().to_lowercase().contains(&kw)
                })
                .collect();
            json!(hits)
        }
        "user" => {
            let users = state.store.users.load().await?;
            let hits: Vec<_> = users
                .into_iter()
                .filter(|u| {
                    u.username.to_lowercase().contains(&kw)
                        || u.email.to_lowercase().contains(&kw)
                        || u.phone.as_deref().is_some_and(|p| p.contains(&kw))
                        || u.role
                            .as_deref()
                            .is_some_and(|r| r.to_lowercase().contains(&kw))
                })
                .collect();
            json!(hits)
        }
        "team" => {
            let teams = state.store.teams.load().await?;
            let hits: Vec<_> = teams
                .into_iter()
                .filter(|t| {
                    t.team_name.to_lowercase().contains(&kw)
                        || t.team_id.to_lowercase().contains(&kw)
                })
                .collect();
            json!(hits)
        }
        _ => {
            return Err(ApiError::BadRequest(
                "Invalid type. Must be task, user, or team.".to_string(),
            ))
        }
    };

    Ok(Json(json!({ "result": result })))
}
