/// Issue source contract and test double
///
/// Everything the importer needs from the remote issue tracker goes through
/// this trait, so the HTTP client can be swapped for a mock in tests. All
/// methods take the acting user's access token; the source itself holds no
/// credentials.

use super::types::{Issue, Project, RemoteUser};
use async_trait::async_trait;
use std::collections::HashMap;

/// Error type for remote issue-source operations
///
/// Remote failures are terminal for the request; nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum GitLabError {
    /// The request could not be sent or the response could not be decoded
    #[error("GitLab request failed: {0}")]
    Request(String),

    /// The remote answered with a non-success status
    #[error("GitLab returned {status}: {message}")]
    Status { status: u16, message: String },
}

/// Read access to a GitLab-like issue tracker
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Fetches the profile of the user the token belongs to
    async fn current_user(&self, access_token: &str) -> Result<RemoteUser, GitLabError>;

    /// Lists the projects the token's user is a member of
    async fn list_projects(&self, access_token: &str) -> Result<Vec<Project>, GitLabError>;

    /// Lists the issues of a project
    async fn list_issues(
        &self,
        access_token: &str,
        project_id: &str,
    ) -> Result<Vec<Issue>, GitLabError>;

    /// Looks up one issue by its project-scoped iid
    ///
    /// Returns `Ok(None)` when the remote has no such issue.
    async fn find_issue(
        &self,
        access_token: &str,
        project_id: &str,
        issue_iid: i64,
    ) -> Result<Option<Issue>, GitLabError>;
}

/// In-memory issue source for tests
///
/// Construct with the fixtures a test needs; every method answers from them.
/// Set `fail` to make every call return a remote failure.
#[derive(Debug, Clone, Default)]
pub struct MockIssueSource {
    /// Profile returned by `current_user`
    pub user: RemoteUser,

    /// Projects returned by `list_projects`
    pub projects: Vec<Project>,

    /// Issues per project id
    pub issues: HashMap<String, Vec<Issue>>,

    /// When true, every call fails as if the remote were unreachable
    pub fail: bool,
}

impl MockIssueSource {
    fn check(&self) -> Result<(), GitLabError> {
        if self.fail {
            return Err(GitLabError::Request("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl IssueSource for MockIssueSource {
    async fn current_user(&self, _access_token: &str) -> Result<RemoteUser, GitLabError> {
        self.check()?;
        Ok(self.user.clone())
    }

    async fn list_projects(&self, _access_token: &str) -> Result<Vec<Project>, GitLabError> {
        self.check()?;
        Ok(self.projects.clone())
    }

    async fn list_issues(
        &self,
        _access_token: &str,
        project_id: &str,
    ) -> Result<Vec<Issue>, GitLabError> {
        self.check()?;
        Ok(self.issues.get(project_id).cloned().unwrap_or_default())
    }

    async fn find_issue(
        &self,
        _access_token: &str,
        project_id: &str,
        issue_iid: i64,
    ) -> Result<Option<Issue>, GitLabError> {
        self.check()?;
        Ok(self
            .issues
            .get(project_id)
            .and_then(|issues| issues.iter().find(|i| i.iid == issue_iid))
            .cloned())
    }
}
