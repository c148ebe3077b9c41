/// Integration tests for the CollabMate API
///
/// These drive the full router end-to-end:
/// - registration, login, and token-version invalidation
/// - the team/task collaboration flow (create, assign, complete, leave)
/// - GitLab linking and idempotent issue import

mod common;

use axum::http::StatusCode;
use collabmate_shared::gitlab::source::MockIssueSource;
use collabmate_shared::gitlab::types::{Issue, RemoteUser};
use common::TestContext;
use serde_json::json;

fn remote_issue(id: i64, iid: i64, state: &str, assignee_ids: &[i64]) -> Issue {
    let assignees: Vec<_> = assignee_ids.iter().map(|id| json!({ "id": id })).collect();
    serde_json::from_value(json!({
        "id": id,
        "iid": iid,
        "title": format!("Issue {}", id),
        "description": "imported",
        "state": state,
        "assignees": assignees,
        "created_at": "2025-03-01T10:00:00Z",
        "updated_at": "2025-03-02T10:00:00Z",
    }))
    .unwrap()
}

/// Requests without a bearer token are rejected
#[tokio::test]
async fn test_authentication_required() {
    let mut ctx = TestContext::new();

    let (status, _) = ctx.request("GET", "/v1/users/all", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .request("POST", "/v1/tasks", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

/// Health endpoint is public
#[tokio::test]
async fn test_health_is_public() {
    let mut ctx = TestContext::new();

    let (status, body) = ctx.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "reachable");
}

/// Registration rejects weak passwords and duplicate emails
#[tokio::test]
async fn test_register_validation() {
    let mut ctx = TestContext::new();

    // No digit in the password.
    let (status, _) = ctx
        .request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "nodigitshere",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    ctx.register("alice", "alice@example.com", "Passw0rd1").await;

    let (status, _) = ctx
        .request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({
                "username": "alice2",
                "email": "alice@example.com",
                "password": "Passw0rd1",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

/// A password change bumps tokenVersion: the old token stops working, a
/// fresh login works
#[tokio::test]
async fn test_token_invalidation_on_password_change() {
    let mut ctx = TestContext::new();
    let (user_id, old_token) = ctx.register("alice", "alice@example.com", "Passw0rd1").await;

    // The freshly issued token works.
    let (status, _) = ctx
        .request("GET", "/v1/users/all", Some(&old_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    // Change the password using that token.
    let (status, _) = ctx
        .request(
            "PATCH",
            &format!("/v1/users/{}/profile", user_id),
            Some(&old_token),
            Some(json!({ "password": "Fresh3rPass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // The old token now embeds a stale version.
    let (status, _) = ctx
        .request("GET", "/v1/users/all", Some(&old_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The old password no longer logs in; the new one issues a valid token.
    let (status, _) = ctx
        .request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "Passw0rd1" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let new_token = ctx.login("alice@example.com", "Fresh3rPass").await;
    let (status, _) = ctx
        .request("GET", "/v1/users/all", Some(&new_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

/// The full collaboration scenario: two users, a team, a task completed,
/// summary totals, and a non-admin departure leaving the team intact
#[tokio::test]
async fn test_collaboration_end_to_end() {
    let mut ctx = TestContext::new();
    let (alice_id, token) = ctx.register("alice", "alice@example.com", "Passw0rd1").await;
    let (bob_id, _) = ctx.register("bob", "bob@example.com", "Passw0rd1").await;

    // Alice creates team "Dream" and is sole member + administrator.
    let (status, body) = ctx
        .request(
            "POST",
            "/v1/teams",
            Some(&token),
            Some(json!({ "teamName": "Dream", "userId": alice_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let team_id = body["team"]["teamId"].as_str().unwrap().to_string();
    assert_eq!(body["team"]["administrator"], alice_id.as_str());

    // Alice adds Bob.
    let (status, body) = ctx
        .request(
            "PATCH",
            &format!("/v1/teams/{}/member", team_id),
            Some(&token),
            Some(json!({ "userId": bob_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["team"]["members"], json!([alice_id, bob_id]));

    // Alice creates task T1 assigned to Bob.
    let (status, body) = ctx
        .request(
            "POST",
            "/v1/tasks",
            Some(&token),
            Some(json!({
                "title": "T1",
                "userIds": [bob_id],
                "userId": alice_id,
                "status": "To Do",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let task_id = body["task"]["taskId"].as_str().unwrap().to_string();
    assert_eq!(body["task"]["creator"], alice_id.as_str());

    // T1 moves to Done.
    let (status, body) = ctx
        .request(
            "PATCH",
            &format!("/v1/tasks/{}/status", task_id),
            Some(&token),
            Some(json!({ "newStatus": "Done" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["status"], "Done");

    // Dashboard summary: 1 total, 1 completed, 0 remaining.
    let (status, body) = ctx
        .request("GET", "/v1/dashboard/summary", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "total": 1, "completed": 1, "remaining": 0 }));

    // Bob leaves: not the administrator, so the team persists unchanged.
    let (status, body) = ctx
        .request(
            "POST",
            &format!("/v1/teams/{}/leave", team_id),
            Some(&token),
            Some(json!({ "userId": bob_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User left the team");

    let (status, body) = ctx
        .request("GET", &format!("/v1/teams/{}", team_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["members"], json!([alice_id]));
    assert_eq!(body["administrator"], alice_id.as_str());
}

/// Administrator succession over the API: FIFO by join order, and a final
/// departure dissolves the team
#[tokio::test]
async fn test_admin_succession_and_dissolution() {
    let mut ctx = TestContext::new();
    let (alice_id, token) = ctx.register("alice", "alice@example.com", "Passw0rd1").await;
    let (bob_id, _) = ctx.register("bob", "bob@example.com", "Passw0rd1").await;

    let (_, body) = ctx
        .request(
            "POST",
            "/v1/teams",
            Some(&token),
            Some(json!({ "teamName": "Dream", "userId": alice_id })),
        )
        .await;
    let team_id = body["team"]["teamId"].as_str().unwrap().to_string();

    ctx.request(
        "PATCH",
        &format!("/v1/teams/{}/member", team_id),
        Some(&token),
        Some(json!({ "userId": bob_id })),
    )
    .await;

    // Administrator leaves; Bob joined second but is now members[0].
    let (status, body) = ctx
        .request(
            "POST",
            &format!("/v1/teams/{}/leave", team_id),
            Some(&token),
            Some(json!({ "userId": alice_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User left the team");
    assert_eq!(body["team"]["administrator"], bob_id.as_str());

    // The last member leaves; the team dissolves.
    let (status, body) = ctx
        .request(
            "POST",
            &format!("/v1/teams/{}/leave", team_id),
            Some(&token),
            Some(json!({ "userId": bob_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Administrator left, team deleted");

    let (status, _) = ctx
        .request("GET", &format!("/v1/teams/{}", team_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Import requires a linked GitLab account
#[tokio::test]
async fn test_import_requires_gitlab_link() {
    let mut ctx = TestContext::new();
    let (_, token) = ctx.register("alice", "alice@example.com", "Passw0rd1").await;

    let (status, body) = ctx
        .request("POST", "/v1/gitlab/projects/42/import", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "GitLab not linked");
}

/// Linking stores the remote id; importing twice yields exactly one local
/// task per remote issue, with assignees resolved through gitlabUserId
#[tokio::test]
async fn test_gitlab_link_and_idempotent_import() {
    let mut source = MockIssueSource {
        user: RemoteUser {
            id: 500,
            username: "alice-remote".to_string(),
            name: None,
        },
        ..Default::default()
    };
    source.issues.insert(
        "42".to_string(),
        vec![
            remote_issue(1, 1, "opened", &[500]),
            remote_issue(2, 2, "closed", &[999]),
        ],
    );

    let mut ctx = TestContext::with_source(source);
    let (alice_id, token) = ctx.register("alice", "alice@example.com", "Passw0rd1").await;

    // Link: the mock resolves the token to remote user 500.
    let (status, body) = ctx
        .request(
            "POST",
            "/v1/gitlab/link",
            Some(&token),
            Some(json!({ "accessToken": "glpat-test" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gitlabUserId"], 500);

    // First import creates both tasks.
    let (status, body) = ctx
        .request("POST", "/v1/gitlab/projects/42/import", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tasks"].as_array().unwrap().len(), 2);

    // Second import targets the same task ids: still two tasks total.
    let (status, _) = ctx
        .request("POST", "/v1/gitlab/projects/42/import", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = ctx.request("GET", "/v1/tasks", Some(&token), None).await;
    let tasks = body["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 2);

    let open = tasks
        .iter()
        .find(|t| t["taskId"] == "gitlab-1")
        .expect("gitlab-1 present");
    // Alice's remote id matched; the unknown assignee on issue 2 was dropped.
    assert_eq!(open["userIds"], json!([alice_id]));
    assert_eq!(open["status"], "To Do");
    assert_eq!(open["creator"], alice_id.as_str());

    let closed = tasks
        .iter()
        .find(|t| t["taskId"] == "gitlab-2")
        .expect("gitlab-2 present");
    assert_eq!(closed["status"], "Done");
    assert_eq!(closed["userIds"], json!([]));
}

/// Single-issue import by iid, including the remote-miss case
#[tokio::test]
async fn test_single_issue_import() {
    let mut source = MockIssueSource {
        user: RemoteUser {
            id: 500,
            username: "alice-remote".to_string(),
            name: None,
        },
        ..Default::default()
    };
    source
        .issues
        .insert("42".to_string(), vec![remote_issue(7, 3, "opened", &[])]);

    let mut ctx = TestContext::with_source(source);
    let (_, token) = ctx.register("alice", "alice@example.com", "Passw0rd1").await;

    ctx.request(
        "POST",
        "/v1/gitlab/link",
        Some(&token),
        Some(json!({ "accessToken": "glpat-test" })),
    )
    .await;

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/gitlab/projects/42/issues/3/import",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["task"]["taskId"], "gitlab-7");

    let (status, _) = ctx
        .request(
            "POST",
            "/v1/gitlab/projects/42/issues/99/import",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Deleting a user cascades into task assignees and team member lists
#[tokio::test]
async fn test_user_delete_cascades() {
    let mut ctx = TestContext::new();
    let (alice_id, token) = ctx.register("alice", "alice@example.com", "Passw0rd1").await;
    let (bob_id, _) = ctx.register("bob", "bob@example.com", "Passw0rd1").await;

    let (_, body) = ctx
        .request(
            "POST",
            "/v1/teams",
            Some(&token),
            Some(json!({ "teamName": "Dream", "userId": alice_id })),
        )
        .await;
    let team_id = body["team"]["teamId"].as_str().unwrap().to_string();
    ctx.request(
        "PATCH",
        &format!("/v1/teams/{}/member", team_id),
        Some(&token),
        Some(json!({ "userId": bob_id })),
    )
    .await;

    let (_, body) = ctx
        .request(
            "POST",
            "/v1/tasks",
            Some(&token),
            Some(json!({
                "title": "T1",
                "userIds": [alice_id, bob_id],
                "userId": alice_id,
            })),
        )
        .await;
    let task_id = body["task"]["taskId"].as_str().unwrap().to_string();

    let (status, _) = ctx
        .request("DELETE", &format!("/v1/users/{}", bob_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = ctx.request("GET", "/v1/tasks", Some(&token), None).await;
    let task = body["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["taskId"] == task_id.as_str())
        .unwrap();
    assert_eq!(task["userIds"], json!([alice_id]));

    let (_, body) = ctx
        .request("GET", &format!("/v1/teams/{}", team_id), Some(&token), None)
        .await;
    assert_eq!(body["members"], json!([alice_id]));
}

/// Delete-all distinguishes the empty no-op from an actual purge
#[tokio::test]
async fn test_delete_all_tasks_noop_distinction() {
    let mut ctx = TestContext::new();
    let (alice_id, token) = ctx.register("alice", "alice@example.com", "Passw0rd1").await;

    let (status, body) = ctx
        .request("DELETE", "/v1/tasks/all", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "No tasks to delete");

    ctx.request(
        "POST",
        "/v1/tasks",
        Some(&token),
        Some(json!({ "title": "T1", "userIds": [], "userId": alice_id })),
    )
    .await;

    let (status, body) = ctx
        .request("DELETE", "/v1/tasks/all", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "All tasks deleted");
}

/// Search endpoint covers the three entity types and validates its params
#[tokio::test]
async fn test_search() {
    let mut ctx = TestContext::new();
    let (alice_id, token) = ctx.register("alice", "alice@example.com", "Passw0rd1").await;

    ctx.request(
        "POST",
        "/v1/tasks",
        Some(&token),
        Some(json!({ "title": "Fix the login page", "userIds": [], "userId": alice_id })),
    )
    .await;

    let (status, body) = ctx
        .request("GET", "/v1/search?type=task&keyword=login", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"].as_array().unwrap().len(), 1);

    let (status, body) = ctx
        .request("GET", "/v1/search?type=user&keyword=ALICE", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"].as_array().unwrap().len(), 1);

    let (status, _) = ctx
        .request("GET", "/v1/search?type=task", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .request("GET", "/v1/search?type=banana&keyword=x", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
