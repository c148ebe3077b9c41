//! # CollabMate API Server
//!
//! REST backend for the CollabMate task/team collaboration app: users,
//! teams with administrator succession, tasks with cascading deletes, and
//! GitLab issue import.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) cargo run -p collabmate-api
//! ```

use collabmate_api::app::{build_router, AppState};
use collabmate_api::config::Config;
use collabmate_shared::gitlab::client::GitLabClient;
use collabmate_shared::store::Datastore;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "collabmate_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "CollabMate API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let store = Arc::new(Datastore::open(&config.storage.data_dir));
    let gitlab = Arc::new(GitLabClient::new(config.gitlab.api_url.clone()));

    let bind_address = config.bind_address();
    let state = AppState::new(store, config, gitlab);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
