use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{middleware, Json, Router};
use serde::Serialize;
use tracing::info;

use crate::store::SqliteLibraryStore;
use crate::user::TokenIssuer;

use super::admin_routes::make_admin_routes;
use super::auth_routes::make_auth_routes;
use super::http_layers::log_requests;
use super::state::{GuardedAccountStore, GuardedCatalogStore, GuardedLibraryStore, ServerState};
use super::user_routes::make_user_routes;
use super::ServerConfig;

#[derive(Serialize)]
struct ServerStats {
    uptime: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    Json(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
    })
}

pub fn make_app(
    config: ServerConfig,
    catalog: GuardedCatalogStore,
    accounts: GuardedAccountStore,
    library: GuardedLibraryStore,
    token_issuer: TokenIssuer,
) -> Router {
    let state = ServerState {
        config,
        start_time: Instant::now(),
        catalog,
        accounts,
        library,
        token_issuer,
    };

    let app: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone())
        .nest("/api/auth", make_auth_routes(state.clone()))
        .nest("/api/admin", make_admin_routes(state.clone()))
        .nest("/api/user", make_user_routes(state.clone()));

    app.layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(
    store: Arc<SqliteLibraryStore>,
    token_issuer: TokenIssuer,
    config: ServerConfig,
) -> Result<()> {
    let port = config.port;
    let app = make_app(
        config,
        store.clone(),
        store.clone(),
        store,
        token_issuer,
    );

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    info!("Listening on port {}", port);
    Ok(axum::serve(listener, app).await?)
}
