//! Cluster configuration routes: env layers, infrastructure `.env`, compose
//! lifecycle, dynamic config and the server ini files.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::AppState;
use crate::cluster::compose::{ComposeAction, ComposeOutput};
use crate::cluster::dynamic::{self, DynamicConfig};
use crate::cluster::envfile::EnvMap;
use crate::cluster::layers::{ClusterSettings, SettingsView};
use crate::container::rcon::BroadcastOutcome;
use crate::error::Result;

#[derive(Serialize)]
struct UpdatedEnvResponse {
    success: bool,
    effective: EnvMap,
}

/// Flags arrive as JSON booleans from the dashboard toggles.
#[derive(Deserialize)]
#[serde(untagged)]
enum ConfigValue {
    Text(String),
    Flag(bool),
}

impl ConfigValue {
    fn into_text(self) -> String {
        match self {
            ConfigValue::Text(text) => text,
            ConfigValue::Flag(flag) => flag.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ClusterConfigRequest {
    updates: BTreeMap<String, ConfigValue>,
}

#[derive(Deserialize)]
struct ComposeRequest {
    action: String,
}

#[derive(Serialize)]
struct DynamicConfigResponse {
    config: DynamicConfig,
    descriptions: BTreeMap<&'static str, &'static str>,
}

#[derive(Deserialize)]
struct DynamicConfigRequest {
    config: DynamicConfig,
}

#[derive(Serialize)]
struct BroadcastResponse {
    success: bool,
    results: Vec<BroadcastOutcome>,
}

#[derive(Serialize, Deserialize)]
struct ConfigFileBody {
    content: String,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

pub fn cluster_router(state: AppState) -> Router {
    Router::new()
        .route("/api/cluster/env", get(get_settings).put(put_settings))
        .route("/api/cluster/config", get(get_cluster_config).post(post_cluster_config))
        .route("/api/cluster/compose", post(run_compose))
        .route("/api/cluster/dynamic", get(get_dynamic).post(post_dynamic))
        .route(
            "/api/cluster/config-file/:filename",
            get(get_config_file).post(post_config_file),
        )
        .with_state(state)
}

async fn get_settings(State(state): State<AppState>) -> Result<Json<SettingsView>> {
    Ok(Json(state.cluster_env.settings()?))
}

async fn put_settings(
    State(state): State<AppState>,
    Json(payload): Json<ClusterSettings>,
) -> Result<Json<UpdatedEnvResponse>> {
    let effective = state.cluster_env.apply_settings(&payload)?;
    state.refresh_catalog_quietly().await;
    Ok(Json(UpdatedEnvResponse {
        success: true,
        effective,
    }))
}

async fn get_cluster_config(State(state): State<AppState>) -> Result<Json<EnvMap>> {
    Ok(Json(state.cluster_env.read_cluster_config()?))
}

async fn post_cluster_config(
    State(state): State<AppState>,
    Json(payload): Json<ClusterConfigRequest>,
) -> Result<Json<UpdatedEnvResponse>> {
    let updates: EnvMap = payload
        .updates
        .into_iter()
        .map(|(key, value)| (key, value.into_text()))
        .collect();
    let env = state.cluster_env.apply_cluster_config(&updates).await?;
    state.refresh_catalog_quietly().await;
    Ok(Json(UpdatedEnvResponse {
        success: true,
        effective: env,
    }))
}

async fn run_compose(
    State(state): State<AppState>,
    Json(payload): Json<ComposeRequest>,
) -> Result<Json<ComposeOutput>> {
    let action: ComposeAction = payload.action.parse()?;
    state.cluster_env.regenerate_effective()?;
    let output = state.compose.run(action).await?;
    if action == ComposeAction::Up {
        state.refresh_catalog_quietly().await;
    }
    Ok(Json(output))
}

async fn get_dynamic(State(state): State<AppState>) -> Result<Json<DynamicConfigResponse>> {
    Ok(Json(DynamicConfigResponse {
        config: state.dynamic.read()?,
        descriptions: dynamic::descriptions(),
    }))
}

async fn post_dynamic(
    State(state): State<AppState>,
    Json(payload): Json<DynamicConfigRequest>,
) -> Result<Json<BroadcastResponse>> {
    state.dynamic.write(&payload.config)?;

    let servers = state.catalog.list()?;
    let running = state.status.running_containers(&servers).await?;
    let results = dynamic::broadcast_reload(&state.rcon, &running).await;
    Ok(Json(BroadcastResponse {
        success: true,
        results,
    }))
}

async fn get_config_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<ConfigFileBody>> {
    Ok(Json(ConfigFileBody {
        content: state.server_ini.read(&filename)?,
    }))
}

async fn post_config_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    Json(payload): Json<ConfigFileBody>,
) -> Result<Json<SuccessResponse>> {
    state.server_ini.write(&filename, &payload.content)?;
    Ok(Json(SuccessResponse { success: true }))
}
