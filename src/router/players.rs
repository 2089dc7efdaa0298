use axum::{extract::State, response::Json, routing::{get, post}, Router};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::container::rcon::BroadcastOutcome;
use crate::error::Result;
use crate::players::profiles::PlayerProfile;

const BYPASS_COMMAND: &str = "AllowPlayerToJoinNoCheck";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    external_id: String,
    #[serde(default)]
    display_name: String,
    /// Also let the player skip the join check on every server
    #[serde(default)]
    bypass: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest {
    external_id: String,
}

#[derive(Serialize)]
struct RegisterResponse {
    success: bool,
    profile: Option<PlayerProfile>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    results: Vec<BroadcastOutcome>,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

pub fn players_router(state: AppState) -> Router {
    Router::new()
        .route("/api/players/profiles", get(list_profiles))
        .route("/api/players/register", post(register_player))
        .route("/api/players/delete", post(delete_player))
        .with_state(state)
}

async fn list_profiles(State(state): State<AppState>) -> Result<Json<Vec<PlayerProfile>>> {
    Ok(Json(state.profiles.list()?))
}

async fn register_player(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    let profile = state
        .profiles
        .set_display_name(&payload.external_id, &payload.display_name)?;

    let mut results = Vec::new();
    if payload.bypass {
        let targets: Vec<String> = state
            .catalog
            .list()?
            .into_iter()
            .map(|server| server.container_name)
            .collect();
        let command = format!("{} {}", BYPASS_COMMAND, payload.external_id);
        results = state.rcon.broadcast(&targets, &command).await;
    }

    Ok(Json(RegisterResponse {
        success: true,
        profile,
        results,
    }))
}

async fn delete_player(
    State(state): State<AppState>,
    Json(payload): Json<DeleteRequest>,
) -> Result<Json<SuccessResponse>> {
    state.profiles.set_display_name(&payload.external_id, "")?;
    Ok(Json(SuccessResponse { success: true }))
}
