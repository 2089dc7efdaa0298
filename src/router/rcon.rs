use axum::{extract::State, response::Json, routing::post, Router};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::cluster::validate::ValidationError;
use crate::error::{Error, Result};

#[derive(Deserialize)]
struct RconRequest {
    #[serde(default)]
    command: String,
    /// Container name or id; the main server when omitted
    target: Option<String>,
}

#[derive(Serialize)]
struct RconResponse {
    target: String,
    output: String,
}

pub fn rcon_router(state: AppState) -> Router {
    Router::new()
        .route("/api/rcon", post(send_command))
        .with_state(state)
}

async fn send_command(
    State(state): State<AppState>,
    Json(payload): Json<RconRequest>,
) -> Result<Json<RconResponse>> {
    let command = payload.command.trim();
    if command.is_empty() {
        return Err(ValidationError::EmptyCommand.into());
    }

    let target = match payload.target.filter(|t| !t.trim().is_empty()) {
        Some(target) => target,
        None => state
            .catalog
            .primary()?
            .map(|server| server.container_name)
            .ok_or_else(|| Error::TargetUnavailable("main server (catalog is empty)".to_string()))?,
    };

    let output = state.rcon.exec(&target, command).await?;
    Ok(Json(RconResponse { target, output }))
}
