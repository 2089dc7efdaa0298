use axum::{extract::State, response::Json, routing::{get, post}, Router};

use super::AppState;
use crate::error::Result;
use crate::servers::catalog::ServerDefinition;

pub fn servers_router(state: AppState) -> Router {
    Router::new()
        .route("/api/servers", get(list_servers))
        .route("/api/servers/refresh", post(refresh_servers))
        .with_state(state)
}

async fn list_servers(State(state): State<AppState>) -> Result<Json<Vec<ServerDefinition>>> {
    Ok(Json(state.catalog.list()?))
}

async fn refresh_servers(State(state): State<AppState>) -> Result<Json<Vec<ServerDefinition>>> {
    Ok(Json(state.catalog.refresh().await?))
}
