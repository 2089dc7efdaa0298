use axum::{
    extract::{Path, Query, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
    routing::{get, post},
    Router,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use super::AppState;
use crate::container::engine::PowerAction;
use crate::container::state::ContainerStatus;
use crate::error::Result;
use crate::logs::stream::open_log_stream;

#[derive(Deserialize)]
struct PowerRequest {
    action: String,
}

#[derive(Deserialize)]
struct LogsQuery {
    tail: Option<usize>,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

pub fn container_router(state: AppState) -> Router {
    Router::new()
        .route("/api/containers", get(list_containers))
        .route("/api/containers/:id", post(power_action))
        .route("/api/containers/:id/logs", get(stream_logs))
        .with_state(state)
}

async fn list_containers(State(state): State<AppState>) -> Result<Json<Vec<ContainerStatus>>> {
    let servers = state.catalog.list()?;
    Ok(Json(state.status.collect(&servers).await?))
}

async fn power_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<PowerRequest>,
) -> Result<Json<SuccessResponse>> {
    let action: PowerAction = payload.action.parse()?;
    state.power.execute_action(&id, action).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Server-sent log events until the container's log ends or the client leaves.
async fn stream_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let tail = query.tail.unwrap_or(state.config.logs.tail);
    let batches = open_log_stream(&state.daemon, &id, tail).await?;
    tracing::info!("Log stream opened for {}", id);

    let events = batches.map(move |batch| {
        let event = match batch {
            Ok(batch) => Event::default()
                .json_data(&batch)
                .unwrap_or_else(|e| Event::default().event("error").data(e.to_string())),
            Err(e) => Event::default().event("error").data(e.to_string()),
        };
        Ok(event)
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
