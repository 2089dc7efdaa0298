//! Public routes

use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;

use super::AppState;
use crate::error::Result;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PingResponse {
    status: String,
    version: String,
    managed_servers: usize,
}

pub fn public_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/public/ping", get(ping))
        .with_state(state)
}

async fn ping(State(state): State<AppState>) -> Result<Json<PingResponse>> {
    Ok(Json(PingResponse {
        status: "ok".to_string(),
        version: state.config.get_version().to_string(),
        managed_servers: state.catalog.list()?.len(),
    }))
}
