/// User model and operations
///
/// Users are the referent of every weak reference in the system: tasks hold
/// assignee user ids, teams hold member user ids, and a user holds at most
/// one `teamId` back-reference. Deleting a user therefore cascades into the
/// task and team collections (see [`User::delete`]).
///
/// Stored/wire JSON uses camelCase field names; these are the exact contracts
/// the frontend and the GitLab importer rely on (`userId`, `tokenVersion`,
/// `gitlabUserId`, ...).

use crate::auth::password;
use crate::error::{CoreError, CoreResult};
use crate::store::{Datastore, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Presence status of a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Online,
    Busy,
    #[default]
    Offline,
}

/// User account record
///
/// `tokenVersion` starts at 0 and is incremented whenever the email or the
/// password changes; tokens embed the version they were issued against, so a
/// bump invalidates every previously issued token for this user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID (UUID v4, immutable)
    pub user_id: String,

    /// Display name
    pub username: String,

    /// Email address, unique across all users
    pub email: String,

    /// Argon2id password hash, never plaintext
    pub password: String,

    /// Credential generation counter; see struct docs
    #[serde(default)]
    pub token_version: u32,

    /// Team role, stored on the user since a user is on at most one team
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Presence status
    #[serde(default)]
    pub status: UserStatus,

    /// Back-reference to the user's team, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,

    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Contact phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// When the user joined their current team
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_date: Option<DateTime<Utc>>,

    /// GitLab OAuth access token; `None` until the account is linked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitlab_access_token: Option<String>,

    /// Remote GitLab user id, used to resolve imported issue assignees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitlab_user_id: Option<i64>,

    /// Legacy single-task reference; only the task delete cascades touch it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    /// Legacy task-id list; only the task delete cascades touch it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<String>>,
}

/// Typed partial profile update
///
/// Exactly the mutable profile fields, nothing stringly-typed: a field left
/// as `None` is untouched. Email and password changes bump `tokenVersion`;
/// a password identical to the stored one is a no-op and does not.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    /// New display name
    pub username: Option<String>,

    /// New email address (bumps `tokenVersion` when it differs)
    pub email: Option<String>,

    /// New phone number
    pub phone: Option<String>,

    /// New avatar URL
    pub image: Option<String>,

    /// New team role
    pub role: Option<String>,

    /// New plaintext password, hashed here (bumps `tokenVersion` when it
    /// differs from the current one)
    pub password: Option<String>,
}

impl UpdateProfile {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.image.is_none()
            && self.role.is_none()
            && self.password.is_none()
    }
}

/// One user's presence status, as returned by the status listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusEntry {
    pub user_id: String,
    pub status: UserStatus,
}

impl User {
    /// Creates a fresh, unaffiliated user record
    ///
    /// `password_hash` must already be an Argon2id hash (see
    /// [`crate::auth::password::hash_password`]). The record starts at
    /// `tokenVersion` 0, status offline, no team, no GitLab link.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            user_id: Uuid::new_v4().to_string(),
            username: username.into(),
            email: email.into(),
            password: password_hash.into(),
            token_version: 0,
            role: None,
            status: UserStatus::default(),
            team_id: None,
            image: None,
            phone: None,
            join_date: None,
            gitlab_access_token: None,
            gitlab_user_id: None,
            task_id: None,
            tasks: None,
        }
    }

    /// Appends `user` to the collection and returns it
    pub async fn create(store: &Datastore, user: User) -> Result<User, StoreError> {
        let _guard = store.users.write_lock().await;
        let mut users = store.users.load().await?;
        users.push(user.clone());
        store.users.save(&users).await?;
        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(store: &Datastore, user_id: &str) -> Result<Option<User>, StoreError> {
        let users = store.users.load().await?;
        Ok(users.into_iter().find(|u| u.user_id == user_id))
    }

    /// Finds a user by email address
    pub async fn find_by_email(store: &Datastore, email: &str) -> Result<Option<User>, StoreError> {
        let users = store.users.load().await?;
        Ok(users.into_iter().find(|u| u.email == email))
    }

    /// Lists all users
    pub async fn list(store: &Datastore) -> Result<Vec<User>, StoreError> {
        store.users.load().await
    }

    /// Sets the presence status of a user
    ///
    /// # Errors
    ///
    /// `NotFound` when the user does not exist.
    pub async fn set_status(
        store: &Datastore,
        user_id: &str,
        status: UserStatus,
    ) -> CoreResult<()> {
        let _guard = store.users.write_lock().await;
        let mut users = store.users.load().await?;
        let user = users
            .iter_mut()
            .find(|u| u.user_id == user_id)
            .ok_or_else(|| CoreError::NotFound("User not found".to_string()))?;
        user.status = status;
        store.users.save(&users).await?;
        Ok(())
    }

    /// Gets the presence status of a user
    pub async fn get_status(store: &Datastore, user_id: &str) -> CoreResult<UserStatus> {
        Self::find_by_id(store, user_id)
            .await?
            .map(|u| u.status)
            .ok_or_else(|| CoreError::NotFound("User not found".to_string()))
    }

    /// Lists every user's presence status
    pub async fn all_statuses(store: &Datastore) -> Result<Vec<UserStatusEntry>, StoreError> {
        let users = store.users.load().await?;
        Ok(users
            .into_iter()
            .map(|u| UserStatusEntry {
                user_id: u.user_id,
                status: u.status,
            })
            .collect())
    }

    /// Applies a typed partial profile update
    ///
    /// Only set fields are touched. An email that actually differs from the
    /// stored one, or a password that does not verify against the stored
    /// hash, increments `tokenVersion` and thereby invalidates every token
    /// issued before the change.
    ///
    /// # Errors
    ///
    /// - `NotFound` when the user does not exist
    /// - `InvalidInput` when no field is set
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use collabmate_shared::models::user::{UpdateProfile, User};
    /// # use collabmate_shared::store::Datastore;
    /// # async fn example(store: &Datastore, id: &str) -> collabmate_shared::error::CoreResult<()> {
    /// let updated = User::update_profile(
    ///     store,
    ///     id,
    ///     UpdateProfile {
    ///         phone: Some("555-0100".to_string()),
    ///         ..Default::default()
    ///     },
    /// )
    /// .await?;
    /// assert_eq!(updated.phone.as_deref(), Some("555-0100"));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn update_profile(
        store: &Datastore,
        user_id: &str,
        changes: UpdateProfile,
    ) -> CoreResult<User> {
        if changes.is_empty() {
            return Err(CoreError::InvalidInput(
                "No valid profile fields to update".to_string(),
            ));
        }

        let _guard = store.users.write_lock().await;
        let mut users = store.users.load().await?;
        let user = users
            .iter_mut()
            .find(|u| u.user_id == user_id)
            .ok_or_else(|| CoreError::NotFound("User not found".to_string()))?;

        let mut token_sensitive_changed = false;

        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(phone) = changes.phone {
            user.phone = Some(phone);
        }
        if let Some(image) = changes.image {
            user.image = Some(image);
        }
        if let Some(role) = changes.role {
            user.role = Some(role);
        }
        if let Some(email) = changes.email {
            if email != user.email {
                user.email = email;
                token_sensitive_changed = true;
            }
        }
        if let Some(plaintext) = changes.password {
            // An unchanged password is a no-op.
            if !password::verify_password(&plaintext, &user.password)? {
                user.password = password::hash_password(&plaintext)?;
                token_sensitive_changed = true;
            }
        }

        if token_sensitive_changed {
            user.token_version += 1;
        }

        let updated = user.clone();
        store.users.save(&users).await?;
        Ok(updated)
    }

    /// Stores the products of a completed GitLab OAuth handshake
    ///
    /// The access token and the resolved remote user id arrive together; the
    /// remote id is what assignee resolution matches against on import.
    ///
    /// # Errors
    ///
    /// `NotFound` when the user does not exist.
    pub async fn link_gitlab(
        store: &Datastore,
        user_id: &str,
        access_token: &str,
        gitlab_user_id: i64,
    ) -> CoreResult<User> {
        let _guard = store.users.write_lock().await;
        let mut users = store.users.load().await?;
        let user = users
            .iter_mut()
            .find(|u| u.user_id == user_id)
            .ok_or_else(|| CoreError::NotFound("User not found".to_string()))?;

        user.gitlab_access_token = Some(access_token.to_string());
        user.gitlab_user_id = Some(gitlab_user_id);

        let updated = user.clone();
        store.users.save(&users).await?;
        Ok(updated)
    }

    /// Clears the stored GitLab access token
    ///
    /// Only the token is cleared; the remote user id is kept so previously
    /// imported assignee mappings remain explainable.
    ///
    /// # Errors
    ///
    /// `NotFound` when the user does not exist.
    pub async fn unlink_gitlab(store: &Datastore, user_id: &str) -> CoreResult<()> {
        let _guard = store.users.write_lock().await;
        let mut users = store.users.load().await?;
        let user = users
            .iter_mut()
            .find(|u| u.user_id == user_id)
            .ok_or_else(|| CoreError::NotFound("User not found".to_string()))?;

        user.gitlab_access_token = None;
        store.users.save(&users).await?;
        Ok(())
    }

    /// Deletes a user and cascades into tasks and teams
    ///
    /// The primary delete is written first; the dependent collections are
    /// then scanned and rewritten only if something actually changed. The
    /// cascades remove the id from every `Task.userIds` (leaving `updatedAt`
    /// untouched, since this is a side effect, not a content edit) and from
    /// every `Team.members`. A failed cascade write is logged and never rolls
    /// back the delete.
    ///
    /// Note: no administrator succession runs on this path. Succession
    /// belongs to the team leave operation; a deleted administrator simply
    /// disappears from the member list, exactly like any other member.
    ///
    /// # Errors
    ///
    /// `NotFound` when the user does not exist.
    pub async fn delete(store: &Datastore, user_id: &str) -> CoreResult<User> {
        let removed = {
            let _guard = store.users.write_lock().await;
            let mut users = store.users.load().await?;
            let idx = users
                .iter()
                .position(|u| u.user_id == user_id)
                .ok_or_else(|| CoreError::NotFound("User not found".to_string()))?;
            let removed = users.remove(idx);
            store.users.save(&users).await?;
            removed
        };

        if let Err(err) = Self::cascade_into_tasks(store, user_id).await {
            tracing::warn!(user_id, error = %err, "task cascade after user delete failed");
        }
        if let Err(err) = Self::cascade_into_teams(store, user_id).await {
            tracing::warn!(user_id, error = %err, "team cascade after user delete failed");
        }

        Ok(removed)
    }

    /// Removes the user id from every task's assignee list
    async fn cascade_into_tasks(store: &Datastore, user_id: &str) -> Result<(), StoreError> {
        let _guard = store.tasks.write_lock().await;
        let mut tasks = store.tasks.load().await?;
        let mut changed = false;
        for task in tasks.iter_mut() {
            if task.user_ids.iter().any(|id| id == user_id) {
                task.user_ids.retain(|id| id != user_id);
                changed = true;
            }
        }
        if changed {
            store.tasks.save(&tasks).await?;
        }
        Ok(())
    }

    /// Removes the user id from every team's member list
    async fn cascade_into_teams(store: &Datastore, user_id: &str) -> Result<(), StoreError> {
        let _guard = store.teams.write_lock().await;
        let mut teams = store.teams.load().await?;
        let mut changed = false;
        for team in teams.iter_mut() {
            if team.members.iter().any(|id| id == user_id) {
                team.members.retain(|id| id != user_id);
                changed = true;
            }
        }
        if changed {
            store.teams.save(&teams).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{CreateTask, Task};
    use crate::models::team::Team;

    async fn seeded_user(store: &Datastore, name: &str) -> User {
        let hash = password::hash_password("Passw0rd1").unwrap();
        User::create(store, User::new(name, format!("{}@example.com", name), hash))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_profile_update_bumps_token_version_on_email_change() {
        let store = Datastore::in_memory();
        let user = seeded_user(&store, "alice").await;
        assert_eq!(user.token_version, 0);

        let updated = User::update_profile(
            &store,
            &user.user_id,
            UpdateProfile {
                email: Some("new@example.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.token_version, 1);
    }

    #[tokio::test]
    async fn test_profile_update_same_email_keeps_token_version() {
        let store = Datastore::in_memory();
        let user = seeded_user(&store, "alice").await;

        let updated = User::update_profile(
            &store,
            &user.user_id,
            UpdateProfile {
                email: Some(user.email.clone()),
                username: Some("alice2".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.username, "alice2");
        assert_eq!(updated.token_version, 0);
    }

    #[tokio::test]
    async fn test_profile_update_password_change_bumps_token_version() {
        let store = Datastore::in_memory();
        let user = seeded_user(&store, "alice").await;

        let updated = User::update_profile(
            &store,
            &user.user_id,
            UpdateProfile {
                password: Some("Different9".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.token_version, 1);
        assert!(password::verify_password("Different9", &updated.password).unwrap());
    }

    #[tokio::test]
    async fn test_profile_update_unchanged_password_is_noop() {
        let store = Datastore::in_memory();
        let user = seeded_user(&store, "alice").await;

        let updated = User::update_profile(
            &store,
            &user.user_id,
            UpdateProfile {
                password: Some("Passw0rd1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.token_version, 0);
        // The stored hash is untouched, never re-hashed plaintext.
        assert_eq!(updated.password, user.password);
    }

    #[tokio::test]
    async fn test_profile_update_rejects_empty_change_set() {
        let store = Datastore::in_memory();
        let user = seeded_user(&store, "alice").await;

        let err = User::update_profile(&store, &user.user_id, UpdateProfile::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_into_tasks_and_teams() {
        let store = Datastore::in_memory();
        let alice = seeded_user(&store, "alice").await;
        let bob = seeded_user(&store, "bob").await;

        let team = Team::create(&store, "Dream", &alice.user_id, "").await.unwrap();
        Team::add_member(&store, &team.team_id, &bob.user_id)
            .await
            .unwrap();

        let task = Task::create(
            &store,
            CreateTask {
                title: "T1".to_string(),
                description: String::new(),
                status: Default::default(),
                deadline: None,
                user_ids: vec![alice.user_id.clone(), bob.user_id.clone()],
                creator: alice.user_id.clone(),
            },
        )
        .await
        .unwrap();

        let deleted = User::delete(&store, &bob.user_id).await.unwrap();
        assert_eq!(deleted.user_id, bob.user_id);

        let task = Task::find_by_id(&store, &task.task_id).await.unwrap().unwrap();
        assert_eq!(task.user_ids, vec![alice.user_id.clone()]);

        let team = Team::find_by_id(&store, &team.team_id).await.unwrap().unwrap();
        assert_eq!(team.members, vec![alice.user_id.clone()]);
    }

    #[tokio::test]
    async fn test_delete_cascade_does_not_touch_task_updated_at() {
        let store = Datastore::in_memory();
        let alice = seeded_user(&store, "alice").await;

        let task = Task::create(
            &store,
            CreateTask {
                title: "T1".to_string(),
                description: String::new(),
                status: Default::default(),
                deadline: None,
                user_ids: vec![alice.user_id.clone()],
                creator: alice.user_id.clone(),
            },
        )
        .await
        .unwrap();

        User::delete(&store, &alice.user_id).await.unwrap();

        let reloaded = Task::find_by_id(&store, &task.task_id).await.unwrap().unwrap();
        assert!(reloaded.user_ids.is_empty());
        assert_eq!(reloaded.updated_at, task.updated_at);
    }

    #[tokio::test]
    async fn test_delete_missing_user_is_not_found() {
        let store = Datastore::in_memory();
        let err = User::delete(&store, "nope").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn test_user_serializes_with_camel_case_contract() {
        let user = User::new("alice", "alice@example.com", "hash");
        let json = serde_json::to_value(&user).unwrap();

        assert!(json.get("userId").is_some());
        assert!(json.get("tokenVersion").is_some());
        assert_eq!(json["status"], "offline");
        // Unset optionals stay out of the snapshot entirely.
        assert!(json.get("teamId").is_none());
        assert!(json.get("gitlabUserId").is_none());
    }
}
