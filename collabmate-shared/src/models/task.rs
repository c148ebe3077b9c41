/// Task model, upsert/merge engine, and delete cascades
///
/// Tasks come from two origins: local creation (fresh UUID id) and GitLab
/// import (deterministic `gitlab-<issue id>` id). The import path goes
/// through [`Task::upsert_batch`], whose merge rule keeps the provenance
/// fields `creator` and `createdAt` sticky: a re-import may update anything
/// else, but never who created the task or when it first appeared.
///
/// The general [`Task::update`] is deliberately asymmetric with upsert: it
/// trusts the caller and will overwrite provenance fields if they are
/// supplied. Both behaviors are pinned by tests below.

use crate::error::{CoreError, CoreResult};
use crate::store::{Datastore, StoreError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Workflow status of a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "To Do")]
    ToDo,

    #[serde(rename = "In Progress")]
    InProgress,

    #[serde(rename = "Done")]
    Done,
}

impl TaskStatus {
    /// Canonical wire string for this status
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID; `gitlab-<issue id>` for imported tasks
    pub task_id: String,

    /// Title, required and non-empty
    pub title: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Workflow status
    #[serde(default)]
    pub status: TaskStatus,

    /// Due date, if any
    #[serde(default)]
    pub deadline: Option<NaiveDate>,

    /// Assignee user ids, no duplicates, order irrelevant
    #[serde(default)]
    pub user_ids: Vec<String>,

    /// User that created the task; immutable once set
    pub creator: String,

    /// Creation time; immutable once set
    pub created_at: DateTime<Utc>,

    /// Refreshed on every content mutation (not by delete cascades)
    pub updated_at: DateTime<Utc>,

    /// Remote issue id for imported tasks
    #[serde(default)]
    pub gitlab_issue_id: Option<i64>,

    /// Remote issue iid (project-scoped) for imported tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitlab_issue_iid: Option<i64>,

    /// Remote project id for imported tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitlab_project_id: Option<String>,
}

/// Input for creating a local task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub deadline: Option<NaiveDate>,
    pub user_ids: Vec<String>,
    pub creator: String,
}

/// Typed partial update for an existing task
///
/// All fields optional; only set fields are applied. `deadline` is a double
/// option so a missing field ("leave alone") and an explicit `null` ("clear
/// the deadline") stay distinguishable.
///
/// This is the trust-the-caller path: `creator` and `createdAt` are
/// intentionally exposed here, unlike [`Task::upsert_batch`] which pins them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub deadline: Option<Option<NaiveDate>>,
    pub user_ids: Option<Vec<String>>,
    pub creator: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Deserializes a field that was present (possibly `null`) into `Some(..)`
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NaiveDate>::deserialize(deserializer).map(Some)
}

/// Filters for the task listing
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Keep tasks with this status
    pub status: Option<TaskStatus>,

    /// Keep tasks assigned to at least one member of this team
    pub team_id: Option<String>,

    /// Keep tasks assigned to this user
    pub user_id: Option<String>,
}

/// Grouping axis for the grouped listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Status,
    Team,
}

/// Outcome of [`Task::delete_all`]
///
/// Distinguishes "nothing to do" from an actual purge so callers can tell
/// the two successes apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeOutcome {
    /// The collection was already empty
    Nothing,

    /// Cleared this many tasks (and users' stale references to them)
    Cleared(usize),
}

impl Task {
    /// Creates a local task
    ///
    /// Assigns a fresh UUID id, stamps `createdAt = updatedAt = now`, and
    /// leaves the GitLab provenance fields unset. An empty assignee list is
    /// valid.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the title or the creator id is blank.
    pub async fn create(store: &Datastore, input: CreateTask) -> CoreResult<Task> {
        if input.title.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "Missing required title".to_string(),
            ));
        }
        if input.creator.trim().is_empty() {
            return Err(CoreError::InvalidInput("Missing userId".to_string()));
        }

        let now = Utc::now();
        let task = Task {
            task_id: Uuid::new_v4().to_string(),
            title: input.title,
            description: input.description,
            status: input.status,
            deadline: input.deadline,
            user_ids: input.user_ids,
            creator: input.creator,
            created_at: now,
            updated_at: now,
            gitlab_issue_id: None,
            gitlab_issue_iid: None,
            gitlab_project_id: None,
        };

        let _guard = store.tasks.write_lock().await;
        let mut tasks = store.tasks.load().await?;
        tasks.push(task.clone());
        store.tasks.save(&tasks).await?;
        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(store: &Datastore, task_id: &str) -> Result<Option<Task>, StoreError> {
        let tasks = store.tasks.load().await?;
        Ok(tasks.into_iter().find(|t| t.task_id == task_id))
    }

    /// Lists all tasks
    pub async fn all(store: &Datastore) -> Result<Vec<Task>, StoreError> {
        store.tasks.load().await
    }

    /// Applies a partial update and refreshes `updatedAt`
    ///
    /// Shallow-merges the set fields over the record. Supplied `creator` /
    /// `createdAt` values are applied as-is (see module docs for the
    /// asymmetry with upsert).
    ///
    /// # Errors
    ///
    /// `NotFound` when the task does not exist.
    pub async fn update(
        store: &Datastore,
        task_id: &str,
        changes: UpdateTask,
    ) -> CoreResult<Task> {
        let _guard = store.tasks.write_lock().await;
        let mut tasks = store.tasks.load().await?;
        let task = tasks
            .iter_mut()
            .find(|t| t.task_id == task_id)
            .ok_or_else(|| CoreError::NotFound("Task not found".to_string()))?;

        if let Some(title) = changes.title {
            task.title = title;
        }
        if let Some(description) = changes.description {
            task.description = description;
        }
        if let Some(status) = changes.status {
            task.status = status;
        }
        if let Some(deadline) = changes.deadline {
            task.deadline = deadline;
        }
        if let Some(user_ids) = changes.user_ids {
            task.user_ids = user_ids;
        }
        if let Some(creator) = changes.creator {
            task.creator = creator;
        }
        if let Some(created_at) = changes.created_at {
            task.created_at = created_at;
        }
        task.updated_at = Utc::now();

        let updated = task.clone();
        store.tasks.save(&tasks).await?;
        Ok(updated)
    }

    /// Adds a user to the assignee list
    ///
    /// Idempotent: an already-assigned user is not duplicated. `updatedAt`
    /// is refreshed either way.
    ///
    /// # Errors
    ///
    /// `NotFound` when the task does not exist.
    pub async fn assign_user(store: &Datastore, task_id: &str, user_id: &str) -> CoreResult<Task> {
        let _guard = store.tasks.write_lock().await;
        let mut tasks = store.tasks.load().await?;
        let task = tasks
            .iter_mut()
            .find(|t| t.task_id == task_id)
            .ok_or_else(|| CoreError::NotFound("Task not found".to_string()))?;

        if !task.user_ids.iter().any(|id| id == user_id) {
            task.user_ids.push(user_id.to_string());
        }
        task.updated_at = Utc::now();

        let updated = task.clone();
        store.tasks.save(&tasks).await?;
        Ok(updated)
    }

    /// Sets the status and refreshes `updatedAt`
    ///
    /// # Errors
    ///
    /// `NotFound` when the task does not exist.
    pub async fn change_status(
        store: &Datastore,
        task_id: &str,
        new_status: TaskStatus,
    ) -> CoreResult<Task> {
        let _guard = store.tasks.write_lock().await;
        let mut tasks = store.tasks.load().await?;
        let task = tasks
            .iter_mut()
            .find(|t| t.task_id == task_id)
            .ok_or_else(|| CoreError::NotFound("Task not found".to_string()))?;

        task.status = new_status;
        task.updated_at = Utc::now();

        let updated = task.clone();
        store.tasks.save(&tasks).await?;
        Ok(updated)
    }

    /// Lists tasks matching the given filters
    ///
    /// The team filter keeps tasks with at least one assignee in the team's
    /// member list.
    ///
    /// # Errors
    ///
    /// `NotFound` when a team filter names an unknown team.
    pub async fn list(store: &Datastore, filter: TaskFilter) -> CoreResult<Vec<Task>> {
        let mut tasks = store.tasks.load().await?;

        if let Some(status) = filter.status {
            tasks.retain(|t| t.status == status);
        }

        if let Some(team_id) = filter.team_id {
            let teams = store.teams.load().await?;
            let team = teams
                .into_iter()
                .find(|t| t.team_id == team_id)
                .ok_or_else(|| CoreError::NotFound("Team not found".to_string()))?;
            tasks.retain(|t| t.user_ids.iter().any(|id| team.members.contains(id)));
        }

        if let Some(user_id) = filter.user_id {
            tasks.retain(|t| t.user_ids.iter().any(|id| id == &user_id));
        }

        Ok(tasks)
    }

    /// Groups all tasks by status or by team
    ///
    /// Grouping by team keys on team id; a task lands in every team that has
    /// at least one of its assignees as a member.
    pub async fn grouped(
        store: &Datastore,
        by: GroupBy,
    ) -> CoreResult<HashMap<String, Vec<Task>>> {
        let tasks = store.tasks.load().await?;
        let mut groups: HashMap<String, Vec<Task>> = HashMap::new();

        match by {
            GroupBy::Status => {
                for task in tasks {
                    groups
                        .entry(task.status.as_str().to_string())
                        .or_default()
                        .push(task);
                }
            }
            GroupBy::Team => {
                let teams = store.teams.load().await?;
                for team in teams {
                    let team_tasks = tasks
                        .iter()
                        .filter(|t| t.user_ids.iter().any(|id| team.members.contains(id)))
                        .cloned()
                        .collect();
                    groups.insert(team.team_id, team_tasks);
                }
            }
        }

        Ok(groups)
    }

    /// Deletes a task, clearing users' stale single-task references to it
    ///
    /// The legacy `taskId` / `tasks[]` fields on user records are the only
    /// things cascaded; assignee lists live on the task itself and vanish
    /// with it. Cascade failures are logged, never propagated.
    ///
    /// # Errors
    ///
    /// `NotFound` when the task does not exist.
    pub async fn delete(store: &Datastore, task_id: &str) -> CoreResult<Task> {
        let removed = {
            let _guard = store.tasks.write_lock().await;
            let mut tasks = store.tasks.load().await?;
            let idx = tasks
                .iter()
                .position(|t| t.task_id == task_id)
                .ok_or_else(|| CoreError::NotFound("Task not found".to_string()))?;
            let removed = tasks.remove(idx);
            store.tasks.save(&tasks).await?;
            removed
        };

        if let Err(err) = Self::clear_user_references(store, Some(task_id)).await {
            tracing::warn!(task_id, error = %err, "user cascade after task delete failed");
        }

        Ok(removed)
    }

    /// Deletes every task
    ///
    /// An already-empty collection is a distinct no-op success. Otherwise
    /// the collection is cleared and every user's legacy task references are
    /// wiped.
    pub async fn delete_all(store: &Datastore) -> CoreResult<PurgeOutcome> {
        let cleared = {
            let _guard = store.tasks.write_lock().await;
            let tasks = store.tasks.load().await?;
            if tasks.is_empty() {
                return Ok(PurgeOutcome::Nothing);
            }
            store.tasks.save(&[]).await?;
            tasks.len()
        };

        if let Err(err) = Self::clear_user_references(store, None).await {
            tracing::warn!(error = %err, "user cascade after task purge failed");
        }

        Ok(PurgeOutcome::Cleared(cleared))
    }

    /// Clears users' legacy task references
    ///
    /// With `Some(task_id)` only references to that task are cleared; with
    /// `None` every reference goes.
    async fn clear_user_references(
        store: &Datastore,
        task_id: Option<&str>,
    ) -> Result<(), StoreError> {
        let _guard = store.users.write_lock().await;
        let mut users = store.users.load().await?;
        let mut changed = false;

        for user in users.iter_mut() {
            match task_id {
                Some(id) => {
                    if user.task_id.as_deref() == Some(id) {
                        user.task_id = None;
                        changed = true;
                    }
                    if let Some(tasks) = user.tasks.as_mut() {
                        let before = tasks.len();
                        tasks.retain(|tid| tid != id);
                        if tasks.len() != before {
                            changed = true;
                        }
                    }
                }
                None => {
                    if user.task_id.is_some() {
                        user.task_id = None;
                        changed = true;
                    }
                    if let Some(tasks) = user.tasks.as_mut() {
                        if !tasks.is_empty() {
                            tasks.clear();
                            changed = true;
                        }
                    }
                }
            }
        }

        if changed {
            store.users.save(&users).await?;
        }
        Ok(())
    }

    /// Inserts or merges a batch of tasks keyed by `taskId`
    ///
    /// One snapshot is loaded, all entries are applied against it, and one
    /// write follows. For an existing id every field is replaced with the
    /// incoming values **except** `createdAt` and `creator`, which are forced
    /// back to the existing record's values: provenance is sticky across
    /// re-imports. Unknown ids are inserted as-is.
    ///
    /// Returns the batch as actually stored (provenance restored).
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use collabmate_shared::models::task::Task;
    /// # use collabmate_shared::store::Datastore;
    /// # async fn example(store: &Datastore, incoming: Vec<Task>) {
    /// let stored = Task::upsert_batch(store, incoming).await.unwrap();
    /// assert!(stored.iter().all(|t| !t.task_id.is_empty()));
    /// # }
    /// ```
    pub async fn upsert_batch(
        store: &Datastore,
        incoming: Vec<Task>,
    ) -> Result<Vec<Task>, StoreError> {
        let _guard = store.tasks.write_lock().await;
        let mut tasks = store.tasks.load().await?;
        let mut index: HashMap<String, usize> = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.task_id.clone(), i))
            .collect();

        let mut stored = Vec::with_capacity(incoming.len());
        for mut task in incoming {
            match index.get(&task.task_id) {
                Some(&i) => {
                    task.created_at = tasks[i].created_at;
                    task.creator = tasks[i].creator.clone();
                    tasks[i] = task.clone();
                }
                None => {
                    index.insert(task.task_id.clone(), tasks.len());
                    tasks.push(task.clone());
                }
            }
            stored.push(task);
        }

        store.tasks.save(&tasks).await?;
        Ok(stored)
    }
}
