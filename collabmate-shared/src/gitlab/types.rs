/// Remote GitLab API shapes
///
/// Only the fields the importer actually consumes are modeled. Issues carry
/// their assignees in either of two shapes depending on the GitLab edition:
/// an `assignees` list, or a single `assignee` object. Both are kept and the
/// importer handles either.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated remote user (`GET /user`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteUser {
    /// Remote user id; matched against local `User.gitlabUserId`
    pub id: i64,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub name: Option<String>,
}

/// A project the remote user is a member of
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
}

/// An issue assignee, in either remote shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueAssignee {
    /// Remote user id
    pub id: i64,

    #[serde(default)]
    pub username: Option<String>,
}

/// A remote issue (`GET /projects/:id/issues`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Globally unique issue id; becomes the `gitlab-<id>` task id
    pub id: i64,

    /// Project-scoped issue iid, used for single-issue lookup
    pub iid: i64,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Remote state; `"closed"` maps to Done, anything else to To Do
    pub state: String,

    #[serde(default)]
    pub due_date: Option<NaiveDate>,

    /// List shape of assignees (takes precedence when present)
    #[serde(default)]
    pub assignees: Option<Vec<IssueAssignee>>,

    /// Single-object shape of assignee
    #[serde(default)]
    pub assignee: Option<IssueAssignee>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Issue summary projection returned by the issue-listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummary {
    pub issue_id: i64,
    pub title: String,
    pub state: String,
    pub issue_iid: i64,
}

impl From<&Issue> for IssueSummary {
    fn from(issue: &Issue) -> Self {
        Self {
            issue_id: issue.id,
            title: issue.title.clone(),
            state: issue.state.clone(),
            issue_iid: issue.iid,
        }
    }
}
