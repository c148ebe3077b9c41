/// Reqwest-backed GitLab API client
///
/// Thin [`IssueSource`] implementation over the GitLab v4 REST API. The base
/// URL is configurable so self-hosted instances (and test servers) work the
/// same as gitlab.com.

use super::source::{GitLabError, IssueSource};
use super::types::{Issue, Project, RemoteUser};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Issues fetched per project listing request
const ISSUES_PER_PAGE: u32 = 50;

/// GitLab REST client
pub struct GitLabClient {
    http: reqwest::Client,
    base_url: String,
}

impl GitLabClient {
    /// Creates a client for the given API base URL
    /// (e.g. `https://gitlab.com/api/v4`)
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
    ) -> Result<T, GitLabError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| GitLabError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GitLabError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GitLabError::Request(e.to_string()))
    }
}

#[async_trait]
impl IssueSource for GitLabClient {
    async fn current_user(&self, access_token: &str) -> Result<RemoteUser, GitLabError> {
        self.get_json("/user", access_token).await
    }

    async fn list_projects(&self, access_token: &str) -> Result<Vec<Project>, GitLabError> {
        self.get_json("/projects?membership=true&simple=true", access_token)
            .await
    }

    async fn list_issues(
        &self,
        access_token: &str,
        project_id: &str,
    ) -> Result<Vec<Issue>, GitLabError> {
        self.get_json(
            &format!(
                "/projects/{}/issues?per_page={}",
                project_id, ISSUES_PER_PAGE
            ),
            access_token,
        )
        .await
    }

    async fn find_issue(
        &self,
        access_token: &str,
        project_id: &str,
        issue_iid: i64,
    ) -> Result<Option<Issue>, GitLabError> {
        let response = self
            .http
            .get(format!(
                "{}/projects/{}/issues/{}",
                self.base_url, project_id, issue_iid
            ))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| GitLabError::Request(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GitLabError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Issue>()
            .await
            .map(Some)
            .map_err(|e| GitLabError::Request(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = GitLabClient::new("https://gitlab.com/api/v4/");
        assert_eq!(client.base_url, "https://gitlab.com/api/v4");
    }
}
