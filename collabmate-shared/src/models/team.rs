/// Team model, membership, and administrator succession
///
/// A team's `members` list is append-ordered: position reflects join order
/// and the list is never reordered except by removal. That ordering is load-
/// bearing: when the administrator leaves, the new administrator is always
/// `members[0]` of the post-removal list, i.e. whichever remaining member
/// joined first. No election, no tiebreak state.
///
/// A team cannot exist with zero members: when the administrator is the last
/// member and leaves, the team itself is deleted.

use crate::error::{CoreError, CoreResult};
use crate::models::task::TaskStatus;
use crate::store::{Datastore, StoreError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Team record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Unique team ID (UUID v4)
    pub team_id: String,

    /// Display name
    pub team_name: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Current administrator; always a member while the team exists
    pub administrator: String,

    /// Member user ids in join order
    pub members: Vec<String>,

    /// When the team was created
    pub created_at: DateTime<Utc>,
}

/// Outcome of a member leaving a team
#[derive(Debug, Clone)]
pub enum Departure {
    /// The team persists, possibly under a new administrator
    Remaining(Team),

    /// The administrator was the last member; the team is gone
    Dissolved,
}

/// Detailed member listing entry: profile fields plus assigned tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDetail {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub image: Option<String>,
    pub phone: String,
    pub role: String,
    pub tasks: Vec<AssignedTask>,
}

/// Task summary shown per member in the detailed listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedTask {
    pub task_id: String,
    pub title: String,
    pub status: TaskStatus,
    pub deadline: Option<NaiveDate>,
}

impl Team {
    /// Creates a team with the creator as sole member and administrator
    ///
    /// Also sets the creator's `teamId` back-reference.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when `team_name` or `creator_id` is blank
    /// - `NotFound` when the creator does not exist
    pub async fn create(
        store: &Datastore,
        team_name: &str,
        creator_id: &str,
        description: &str,
    ) -> CoreResult<Team> {
        if team_name.trim().is_empty() || creator_id.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "Missing teamName or userId".to_string(),
            ));
        }

        // The creator must exist before any snapshot is touched.
        let users = store.users.load().await?;
        if !users.iter().any(|u| u.user_id == creator_id) {
            return Err(CoreError::NotFound("User not found".to_string()));
        }

        let team = Team {
            team_id: Uuid::new_v4().to_string(),
            team_name: team_name.to_string(),
            description: description.to_string(),
            administrator: creator_id.to_string(),
            members: vec![creator_id.to_string()],
            created_at: Utc::now(),
        };

        {
            let _guard = store.teams.write_lock().await;
            let mut teams = store.teams.load().await?;
            teams.push(team.clone());
            store.teams.save(&teams).await?;
        }

        {
            let _guard = store.users.write_lock().await;
            let mut users = store.users.load().await?;
            if let Some(user) = users.iter_mut().find(|u| u.user_id == creator_id) {
                user.team_id = Some(team.team_id.clone());
                store.users.save(&users).await?;
            }
        }

        Ok(team)
    }

    /// Finds a team by ID
    pub async fn find_by_id(store: &Datastore, team_id: &str) -> Result<Option<Team>, StoreError> {
        let teams = store.teams.load().await?;
        Ok(teams.into_iter().find(|t| t.team_id == team_id))
    }

    /// Finds a team by ID, failing with `NotFound` when absent
    pub async fn get(store: &Datastore, team_id: &str) -> CoreResult<Team> {
        Self::find_by_id(store, team_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Team not found".to_string()))
    }

    /// Adds a user to the team
    ///
    /// Idempotent: adding an existing member is a no-op success and never
    /// produces a duplicate entry. A first-time add appends the user to the
    /// end of `members` (preserving join order for succession) and stamps the
    /// user's `teamId` and `joinDate`.
    ///
    /// # Errors
    ///
    /// `NotFound` when the team or the user does not exist.
    pub async fn add_member(store: &Datastore, team_id: &str, user_id: &str) -> CoreResult<Team> {
        let users = store.users.load().await?;
        if !users.iter().any(|u| u.user_id == user_id) {
            return Err(CoreError::NotFound("User not found".to_string()));
        }

        let (team, newly_added) = {
            let _guard = store.teams.write_lock().await;
            let mut teams = store.teams.load().await?;
            let team = teams
                .iter_mut()
                .find(|t| t.team_id == team_id)
                .ok_or_else(|| CoreError::NotFound("Team not found".to_string()))?;

            if team.members.iter().any(|m| m == user_id) {
                (team.clone(), false)
            } else {
                team.members.push(user_id.to_string());
                let team = team.clone();
                store.teams.save(&teams).await?;
                (team, true)
            }
        };

        if newly_added {
            let _guard = store.users.write_lock().await;
            let mut users = store.users.load().await?;
            if let Some(user) = users.iter_mut().find(|u| u.user_id == user_id) {
                user.team_id = Some(team_id.to_string());
                user.join_date = Some(Utc::now());
                store.users.save(&users).await?;
            }
        }

        Ok(team)
    }

    /// Assigns a role to a team member
    ///
    /// The role lives on the user record, not the team: a user can hold only
    /// one role since they can be on only one team. The team snapshot is not
    /// consulted; membership is judged by the user's `teamId` back-reference.
    ///
    /// # Errors
    ///
    /// - `NotFound` when the user does not exist
    /// - `InvalidState` ("User not in this team") when the user's `teamId`
    ///   does not match
    pub async fn assign_role(
        store: &Datastore,
        team_id: &str,
        user_id: &str,
        role: &str,
    ) -> CoreResult<()> {
        let _guard = store.users.write_lock().await;
        let mut users = store.users.load().await?;
        let user = users
            .iter_mut()
            .find(|u| u.user_id == user_id)
            .ok_or_else(|| CoreError::NotFound("User not found".to_string()))?;

        if user.team_id.as_deref() != Some(team_id) {
            return Err(CoreError::InvalidState(
                "User not in this team".to_string(),
            ));
        }

        user.role = Some(role.to_string());
        store.users.save(&users).await?;
        Ok(())
    }

    /// Removes `user_id` from the member list and applies the succession rule
    ///
    /// Returns `true` when the team must be dissolved (the leaver was the
    /// administrator and the last member). Otherwise, if the leaver was the
    /// administrator, the earliest remaining member by join order becomes the
    /// new administrator.
    pub fn remove_member(&mut self, user_id: &str) -> bool {
        self.members.retain(|m| m != user_id);

        if self.administrator != user_id {
            return false;
        }

        match self.members.first() {
            Some(next) => {
                self.administrator = next.clone();
                false
            }
            None => true,
        }
    }

    /// A user leaves the team
    ///
    /// Removes the user from `members` and clears the user's `teamId` and
    /// `role`. If the leaver was the administrator, succession applies (see
    /// [`Team::remove_member`]); an administrator leaving an otherwise empty
    /// team dissolves it.
    ///
    /// # Errors
    ///
    /// - `NotFound` when the team does not exist
    /// - `InvalidState` ("User not in team") when the user is not a member
    pub async fn leave(store: &Datastore, team_id: &str, user_id: &str) -> CoreResult<Departure> {
        let outcome = {
            let _guard = store.teams.write_lock().await;
            let mut teams = store.teams.load().await?;
            let idx = teams
                .iter()
                .position(|t| t.team_id == team_id)
                .ok_or_else(|| CoreError::NotFound("Team not found".to_string()))?;

            if !teams[idx].members.iter().any(|m| m == user_id) {
                return Err(CoreError::InvalidState("User not in team".to_string()));
            }

            let dissolved = teams[idx].remove_member(user_id);
            let outcome = if dissolved {
                teams.remove(idx);
                Departure::Dissolved
            } else {
                Departure::Remaining(teams[idx].clone())
            };
            store.teams.save(&teams).await?;
            outcome
        };

        // Clear the leaver's affiliation, if they still exist in Users.
        {
            let _guard = store.users.write_lock().await;
            let mut users = store.users.load().await?;
            if let Some(user) = users.iter_mut().find(|u| u.user_id == user_id) {
                user.team_id = None;
                user.role = None;
                store.users.save(&users).await?;
            }
        }

        Ok(outcome)
    }

    /// Deletes a team, clearing members' `teamId` back-references
    ///
    /// Member `role` values are left as-is; only the team affiliation is
    /// cleared. The cascade is best-effort: a failed dependent write is
    /// logged and never rolls back the delete.
    ///
    /// # Errors
    ///
    /// `NotFound` when the team does not exist.
    pub async fn delete(store: &Datastore, team_id: &str) -> CoreResult<Team> {
        let removed = {
            let _guard = store.teams.write_lock().await;
            let mut teams = store.teams.load().await?;
            let idx = teams
                .iter()
                .position(|t| t.team_id == team_id)
                .ok_or_else(|| CoreError::NotFound("Team not found".to_string()))?;
            let removed = teams.remove(idx);
            store.teams.save(&teams).await?;
            removed
        };

        if let Err(err) = Self::clear_member_affiliations(store, team_id).await {
            tracing::warn!(team_id, error = %err, "user cascade after team delete failed");
        }

        Ok(removed)
    }

    /// Nulls `teamId` on every user that belonged to the team
    async fn clear_member_affiliations(store: &Datastore, team_id: &str) -> Result<(), StoreError> {
        let _guard = store.users.write_lock().await;
        let mut users = store.users.load().await?;
        let mut changed = false;
        for user in users.iter_mut() {
            if user.team_id.as_deref() == Some(team_id) {
                user.team_id = None;
                changed = true;
            }
        }
        if changed {
            store.users.save(&users).await?;
        }
        Ok(())
    }

    /// Detailed member listing: profile fields plus each member's assigned
    /// tasks
    ///
    /// Member ids without a matching user record are skipped.
    ///
    /// # Errors
    ///
    /// `NotFound` when the team does not exist.
    pub async fn detailed_members(
        store: &Datastore,
        team_id: &str,
    ) -> CoreResult<Vec<MemberDetail>> {
        let team = Self::get(store, team_id).await?;
        let users = store.users.load().await?;
        let tasks = store.tasks.load().await?;

        let details = team
            .members
            .iter()
            .filter_map(|member_id| {
                let user = users.iter().find(|u| &u.user_id == member_id)?;
                let assigned = tasks
                    .iter()
                    .filter(|t| t.user_ids.iter().any(|id| id == member_id))
                    .map(|t| AssignedTask {
                        task_id: t.task_id.clone(),
                        title: t.title.clone(),
                        status: t.status,
                        deadline: t.deadline,
                    })
                    .collect();

                Some(MemberDetail {
                    user_id: user.user_id.clone(),
                    username: user.username.clone(),
                    email: user.email.clone(),
                    image: user.image.clone(),
                    phone: user.phone.clone().unwrap_or_default(),
                    role: user.role.clone().unwrap_or_default(),
                    tasks: assigned,
                })
            })
            .collect();

        Ok(details)
    }
}
