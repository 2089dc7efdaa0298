//! Rich per-server status: daemon state, log heuristics, marker files and
//! live player lists merged into one record.
//!
//! A failure while interrogating one server only drops that server's
//! optional fields. The listing itself fails only when the daemon can't list
//! containers at all.

use futures::future::join_all;
use regex::Regex;
use std::sync::{Arc, LazyLock};

use super::engine::{collect_text, ContainerSummary, LogRequest, SharedDaemon};
use super::rcon::{OnlinePlayer, RconBridge};
use super::signals::{ClusterSignals, SignalDir};
use super::state::{ContainerStatus, Health, NOT_CREATED};
use crate::cluster::maps;
use crate::error::Result;
use crate::players::profiles::PlayerProfiles;
use crate::servers::catalog::ServerDefinition;

/// Printed by the container start script once SIGTERM is received.
pub const SHUTDOWN_ANNOUNCEMENT: &str = "Received shutdown signal. Exiting...";

static HEALTH_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((healthy|unhealthy|starting)\)").expect("health pattern is valid")
});

pub fn parse_health(status: &str) -> Option<Health> {
    HEALTH_TOKEN
        .captures(status)
        .and_then(|caps| Health::parse(&caps[1]))
}

pub struct ContainerStateService {
    daemon: SharedDaemon,
    rcon: Arc<RconBridge>,
    profiles: Arc<PlayerProfiles>,
    signals: SignalDir,
    status_tail: usize,
}

impl ContainerStateService {
    pub fn new(
        daemon: SharedDaemon,
        rcon: Arc<RconBridge>,
        profiles: Arc<PlayerProfiles>,
        signals: SignalDir,
        status_tail: usize,
    ) -> Self {
        Self {
            daemon,
            rcon,
            profiles,
            signals,
            status_tail,
        }
    }

    /// One status per server, in catalog order.
    pub async fn collect(&self, servers: &[ServerDefinition]) -> Result<Vec<ContainerStatus>> {
        let containers = self.daemon.list_containers().await?;
        let cluster = self.signals.cluster_signals();

        let statuses = servers.iter().map(|server| {
            let container = containers
                .iter()
                .find(|c| c.has_name(&server.container_name) || c.has_name(&server.id));
            self.server_status(server, container, cluster)
        });
        Ok(join_all(statuses).await)
    }

    /// Names of catalog servers whose container is running. No log or RCON calls.
    pub async fn running_containers(&self, servers: &[ServerDefinition]) -> Result<Vec<String>> {
        let containers = self.daemon.list_containers().await?;
        Ok(servers
            .iter()
            .filter(|server| {
                containers.iter().any(|c| {
                    c.state == "running"
                        && (c.has_name(&server.container_name) || c.has_name(&server.id))
                })
            })
            .map(|server| server.container_name.clone())
            .collect())
    }

    async fn server_status(
        &self,
        server: &ServerDefinition,
        container: Option<&ContainerSummary>,
        cluster: ClusterSignals,
    ) -> ContainerStatus {
        let detailed_state = self.signals.overlay(cluster, server.port);
        let map = maps::display_name(&server.map_raw).to_string();

        let Some(container) = container else {
            return ContainerStatus {
                id: server.id.clone(),
                name: server.container_name.clone(),
                image: "(not created)".to_string(),
                state: NOT_CREATED.to_string(),
                status: "Not created".to_string(),
                health: None,
                is_stopping: false,
                detailed_state,
                map,
                map_raw: server.map_raw.clone(),
                session_name: server.session_name.clone(),
                online_players: None,
                is_managed: true,
            };
        };

        let health = parse_health(&container.status);
        let mut is_stopping = false;
        let mut online_players = None;

        if container.state == "running" {
            match self.shutdown_announced(&container.id).await {
                Ok(announced) => is_stopping = announced,
                Err(e) => tracing::warn!("Failed to check logs of {}: {}", server.id, e),
            }

            if health == Some(Health::Healthy) {
                online_players = self.players(&container.id, &server.id).await;
            }
        }

        ContainerStatus {
            id: container.id.clone(),
            name: server.container_name.clone(),
            image: container.image.clone(),
            state: container.state.clone(),
            status: container.status.clone(),
            health,
            is_stopping,
            detailed_state,
            map,
            map_raw: server.map_raw.clone(),
            session_name: server.session_name.clone(),
            online_players,
            is_managed: true,
        }
    }

    async fn shutdown_announced(&self, container_id: &str) -> Result<bool> {
        let request = LogRequest {
            follow: false,
            tail: self.status_tail,
            timestamps: false,
        };
        let stream = self.daemon.logs(container_id, request).await?;
        let text = collect_text(stream).await?;
        Ok(text.contains(SHUTDOWN_ANNOUNCEMENT))
    }

    async fn players(&self, container_id: &str, server_id: &str) -> Option<Vec<OnlinePlayer>> {
        match self.rcon.online_players(container_id, &self.profiles).await {
            Ok(players) => Some(players),
            Err(e) => {
                tracing::warn!("Failed to list players on {}: {}", server_id, e);
                None
            }
        }
    }
}
