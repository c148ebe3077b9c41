/// Application state and router builder
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware.
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                       # Health check (public)
/// ├── /v1/
/// │   ├── /auth/                    # register, login (public)
/// │   ├── /users/                   # profiles, status, delete
/// │   ├── /teams/                   # membership, roles, leave
/// │   ├── /tasks/                   # CRUD, assignment, grouping
/// │   ├── /gitlab/                  # link, projects, issue import
/// │   ├── /dashboard/               # calendar, summary, progress
/// │   └── /search                   # keyword search
/// ```
///
/// Everything under `/v1` except `/v1/auth` sits behind [`jwt_auth_layer`],
/// which validates the bearer token and additionally rejects tokens whose
/// embedded `tokenVersion` no longer matches the user's stored one (issued
/// before an email or password change).

use crate::{config::Config, error::ApiError};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post, put},
    Router,
};
use collabmate_shared::auth::{jwt, middleware::AuthContext};
use collabmate_shared::gitlab::source::IssueSource;
use collabmate_shared::models::user::User;
use collabmate_shared::store::Datastore;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; everything
/// inside is behind an Arc, so the clone is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Record store over the three collections
    pub store: Arc<Datastore>,

    /// Application configuration
    pub config: Arc<Config>,

    /// Remote issue source (reqwest client in production, mock in tests)
    pub gitlab: Arc<dyn IssueSource>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<Datastore>, config: Config, gitlab: Arc<dyn IssueSource>) -> Self {
        Self {
            store,
            config: Arc::new(config),
            gitlab,
        }
    }

    /// Gets the JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let user_routes = Router::new()
        .route("/all", get(routes::users::list_users))
        .route("/status/all", get(routes::users::all_statuses))
        .route("/:userId/status", get(routes::users::get_status))
        .route("/:userId/status", patch(routes::users::set_status))
        .route("/:userId/profile", get(routes::users::get_profile))
        .route("/:userId/profile", patch(routes::users::update_profile))
        .route("/:userId", delete(routes::users::delete_user));

    let team_routes = Router::new()
        .route("/", post(routes::teams::create_team))
        .route("/:teamId/member", patch(routes::teams::add_member))
        .route("/:teamId/role", patch(routes::teams::assign_role))
        .route("/:teamId", get(routes::teams::get_team))
        .route(
            "/:teamId/members/detailed",
            get(routes::teams::detailed_members),
        )
        .route("/:teamId", delete(routes::teams::delete_team))
        .route("/:teamId/leave", post(routes::teams::leave_team));

    let task_routes = Router::new()
        .route("/", post(routes::tasks::create_task))
        .route("/", get(routes::tasks::list_tasks))
        .route("/grouped", get(routes::tasks::grouped_tasks))
        .route("/all", delete(routes::tasks::delete_all_tasks))
        .route("/:taskId", put(routes::tasks::update_task))
        .route("/:taskId/assign", patch(routes::tasks::assign_task))
        .route("/:taskId/status", patch(routes::tasks::change_status))
        .route("/:taskId", delete(routes::tasks::delete_task));

    let gitlab_routes = Router::new()
        .route("/link", post(routes::gitlab::link))
        .route("/link", delete(routes::gitlab::unlink))
        .route("/user", get(routes::gitlab::remote_user))
        .route("/projects", get(routes::gitlab::list_projects))
        .route(
            "/projects/:projectId/issues",
            get(routes::gitlab::list_issues),
        )
        .route(
            "/projects/:projectId/import",
            post(routes::gitlab::import_project),
        )
        .route(
            "/projects/:projectId/issues/:issueIid/import",
            post(routes::gitlab::import_single_issue),
        );

    let dashboard_routes = Router::new()
        .route("/calendar", get(routes::dashboard::calendar))
        .route("/summary", get(routes::dashboard::summary))
        .route(
            "/tasks/:taskId/progress",
            get(routes::dashboard::task_progress),
        );

    let search_routes = Router::new().route("/", get(routes::search::search));

    // Everything except auth and health requires a verified bearer token.
    let protected_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/teams", team_routes)
        .nest("/tasks", task_routes)
        .nest("/gitlab", gitlab_routes)
        .nest("/dashboard", dashboard_routes)
        .nest("/search", search_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts the bearer token, validates signature/expiry/issuer, then
/// re-loads the user and rejects the request when the user is gone or the
/// token's embedded `tokenVersion` no longer matches the stored one. On
/// success an [`AuthContext`] is injected into the request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing token".to_string()))?;

    // Parse Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    // Validate signature, expiry, and issuer
    let claims = jwt::validate_token(token, state.jwt_secret())?;

    // Reject tokens issued before the user's last credential change
    let user = User::find_by_id(&state.store, &claims.sub)
        .await?
        .ok_or_else(|| {
            ApiError::Unauthorized(
                "Token expired or user not found, please login again".to_string(),
            )
        })?;
    jwt::validate_for_user(&claims, &user)?;

    // Insert into request extensions
    req.extensions_mut().insert(AuthContext::new(claims.sub));

    Ok(next.run(req).await)
}
