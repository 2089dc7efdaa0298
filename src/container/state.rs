use serde::{Deserialize, Serialize};

use super::rcon::OnlinePlayer;

pub const NOT_CREATED: &str = "not_created";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Healthy,
    Unhealthy,
    Starting,
}

impl Health {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "healthy" => Some(Health::Healthy),
            "unhealthy" => Some(Health::Unhealthy),
            "starting" => Some(Health::Starting),
            _ => None,
        }
    }
}

/// Cluster-wide or per-unit state signalled through marker files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailedState {
    #[serde(rename = "UPDATING")]
    Updating,
    #[serde(rename = "MAINTENANCE")]
    Maintenance,
    #[serde(rename = "UPDATE REQ")]
    UpdateRequested,
    #[serde(rename = "WAITING")]
    Waiting,
}

/// Status of one managed server, computed fresh for every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStatus {
    /// Daemon container id, or the service key if no container exists
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<Health>,
    pub is_stopping: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_state: Option<DetailedState>,
    pub map: String,
    pub map_raw: String,
    pub session_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online_players: Option<Vec<OnlinePlayer>>,
    pub is_managed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_for_the_dashboard() {
        let status = ContainerStatus {
            id: "abc".into(),
            name: "asa0".into(),
            image: "asa-linux-server".into(),
            state: "running".into(),
            status: "Up 2 hours (healthy)".into(),
            health: Some(Health::Healthy),
            is_stopping: false,
            detailed_state: Some(DetailedState::UpdateRequested),
            map: "The Island".into(),
            map_raw: "TheIsland_WP".into(),
            session_name: "Main".into(),
            online_players: None,
            is_managed: true,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["detailedState"], "UPDATE REQ");
        assert_eq!(json["health"], "healthy");
        assert_eq!(json["isStopping"], false);
        assert!(json.get("onlinePlayers").is_none());
    }

    #[test]
    fn reads_back_a_status_with_players() {
        let json = serde_json::json!({
            "id": "abc",
            "name": "asa1",
            "image": "asa-linux-server",
            "state": "running",
            "status": "Up 5 minutes",
            "isStopping": false,
            "map": "Ragnarok",
            "mapRaw": "Ragnarok_WP",
            "sessionName": "Rag",
            "onlinePlayers": [
                {"displayName": "Rex", "externalId": "0123456789abcdef0123456789abcdef"}
            ],
            "isManaged": true
        });
        let status: ContainerStatus = serde_json::from_value(json).unwrap();
        let players = status.online_players.unwrap();
        assert_eq!(players[0].display_name, "Rex");
        assert!(status.health.is_none());
    }
}
