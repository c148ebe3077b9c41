/// GitLab issue importer
///
/// Maps remote issues into local tasks and merges them through the
/// provenance-preserving upsert. The mapping is deliberately deterministic:
///
/// - task id is always `gitlab-<issue id>`, so re-importing the same issue
///   targets the same local task instead of creating a second one;
/// - remote `closed` maps to Done and every other remote state to To Do. A
///   local transition to In Progress is therefore collapsed back to To Do by
///   the next re-import of an open issue; a known one-way mapping, kept
///   as-is;
/// - remote assignees resolve to local users by `gitlabUserId`; assignees
///   with no local match are dropped silently;
/// - the importer becomes `creator` on first import, and stays creator across
///   re-imports by other users because upsert pins provenance.

use super::source::IssueSource;
use super::types::Issue;
use crate::error::{CoreError, CoreResult};
use crate::models::task::{Task, TaskStatus};
use crate::models::user::User;
use crate::store::Datastore;
use chrono::{DateTime, Utc};

/// Resolves an issue's remote assignees to local user ids
///
/// Handles both remote shapes: the `assignees` list takes precedence when
/// present (even empty); otherwise the single `assignee` object is used.
/// Remote assignees without a local `gitlabUserId` match are skipped.
pub fn resolve_assignees(issue: &Issue, users: &[User]) -> Vec<String> {
    let remote: Vec<i64> = match (&issue.assignees, &issue.assignee) {
        (Some(list), _) => list.iter().map(|a| a.id).collect(),
        (None, Some(single)) => vec![single.id],
        (None, None) => Vec::new(),
    };

    remote
        .into_iter()
        .filter_map(|remote_id| {
            users
                .iter()
                .find(|u| u.gitlab_user_id == Some(remote_id))
                .map(|u| u.user_id.clone())
        })
        .collect()
}

/// Maps one remote issue to the local task shape
///
/// `now` backstops missing remote timestamps so bulk imports stamp one
/// consistent time.
pub fn issue_to_task(
    issue: &Issue,
    project_id: &str,
    users: &[User],
    importer_id: &str,
    now: DateTime<Utc>,
) -> Task {
    Task {
        task_id: format!("gitlab-{}", issue.id),
        title: issue.title.clone(),
        description: issue.description.clone().unwrap_or_default(),
        status: if issue.state == "closed" {
            TaskStatus::Done
        } else {
            TaskStatus::ToDo
        },
        deadline: issue.due_date,
        user_ids: resolve_assignees(issue, users),
        creator: importer_id.to_string(),
        created_at: issue.created_at.unwrap_or(now),
        updated_at: issue.updated_at.unwrap_or(now),
        gitlab_issue_id: Some(issue.id),
        gitlab_issue_iid: Some(issue.iid),
        gitlab_project_id: Some(project_id.to_string()),
    }
}

/// Returns the acting user's GitLab access token
///
/// # Errors
///
/// `Unauthorized` ("GitLab not linked") when the user does not exist or has
/// not linked a GitLab account.
pub async fn linked_access_token(store: &Datastore, user_id: &str) -> CoreResult<String> {
    match User::find_by_id(store, user_id).await? {
        Some(user) => user
            .gitlab_access_token
            .ok_or_else(|| CoreError::Unauthorized("GitLab not linked".to_string())),
        None => Err(CoreError::Unauthorized("GitLab not linked".to_string())),
    }
}

/// Imports every issue of a project as local tasks
///
/// Fetches the project's issues, maps them against one snapshot of local
/// users, and applies the whole batch through one upsert. Returns the tasks
/// as stored (provenance restored for re-imports).
///
/// # Errors
///
/// - `Unauthorized` when the acting user has no GitLab link
/// - `RemoteFailure` when the remote call fails
pub async fn import_project_issues(
    store: &Datastore,
    source: &dyn IssueSource,
    importer_id: &str,
    project_id: &str,
) -> CoreResult<Vec<Task>> {
    let access_token = linked_access_token(store, importer_id).await?;
    let issues = source.list_issues(&access_token, project_id).await?;

    let users = store.users.load().await?;
    let now = Utc::now();
    let incoming: Vec<Task> = issues
        .iter()
        .map(|issue| issue_to_task(issue, project_id, &users, importer_id, now))
        .collect();

    tracing::info!(
        project_id,
        count = incoming.len(),
        "importing GitLab issues as tasks"
    );

    Ok(Task::upsert_batch(store, incoming).await?)
}

/// Imports a single issue by its project-scoped iid
///
/// # Errors
///
/// - `Unauthorized` when the acting user has no GitLab link
/// - `NotFound` when the remote lookup yields nothing
/// - `RemoteFailure` when the remote call fails
pub async fn import_issue(
    store: &Datastore,
    source: &dyn IssueSource,
    importer_id: &str,
    project_id: &str,
    issue_iid: i64,
) -> CoreResult<Task> {
    let access_token = linked_access_token(store, importer_id).await?;
    let issue = source
        .find_issue(&access_token, project_id, issue_iid)
        .await?
        .ok_or_else(|| CoreError::NotFound("Issue not found".to_string()))?;

    let users = store.users.load().await?;
    let task = issue_to_task(&issue, project_id, &users, importer_id, Utc::now());

    let mut stored = Task::upsert_batch(store, vec![task]).await?;
    stored
        .pop()
        .ok_or_else(|| CoreError::Internal("upsert returned an empty batch".to_string()))
}
