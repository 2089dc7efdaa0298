//! RCON bridge: administrative commands tunnelled through a daemon exec.
//!
//! Each call opens its own exec session running `<entrypoint> rcon <command>`
//! inside the game container and collects the decoded output. Calls are
//! never retried since most console commands are not idempotent.

use futures::future::join_all;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::engine::{collect_text, SharedDaemon};
use crate::error::Result;
use crate::players::profiles::PlayerProfiles;

pub const LIST_PLAYERS: &str = "ListPlayers";
const NO_PLAYERS: &str = "No Players";

static PLAYER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+\.\s+([^,]+),\s+([a-f0-9]{32})").expect("player line pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlinePlayer {
    pub display_name: String,
    pub external_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Fulfilled,
    Rejected,
}

/// Result of one target in a best-effort broadcast
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastOutcome {
    pub container_name: String,
    pub status: OutcomeStatus,
    pub output: String,
}

#[derive(Clone)]
pub struct RconBridge {
    daemon: SharedDaemon,
    entrypoint: String,
}

impl RconBridge {
    pub fn new(daemon: SharedDaemon, entrypoint: impl Into<String>) -> Self {
        Self {
            daemon,
            entrypoint: entrypoint.into(),
        }
    }

    /// Run one console command and return its trimmed output.
    pub async fn exec(&self, container: &str, command: &str) -> Result<String> {
        tracing::info!("Sending rcon command to {}: {}", container, command);

        let cmd = vec![
            self.entrypoint.clone(),
            "rcon".to_string(),
            command.to_string(),
        ];
        let stream = self.daemon.exec(container, cmd).await?;
        let output = collect_text(stream).await?;

        Ok(output.trim().to_string())
    }

    /// Players currently connected, with registered display names substituted.
    pub async fn online_players(
        &self,
        container: &str,
        profiles: &PlayerProfiles,
    ) -> Result<Vec<OnlinePlayer>> {
        let output = self.exec(container, LIST_PLAYERS).await?;
        let mut players = parse_player_list(&output);
        for player in &mut players {
            match profiles.display_name(&player.external_id) {
                Ok(Some(name)) => player.display_name = name,
                Ok(None) => {}
                Err(e) => tracing::warn!("Profile lookup failed for {}: {}", player.external_id, e),
            }
        }
        Ok(players)
    }

    /// Send the same command to every target concurrently.
    ///
    /// Every target is attempted; failures are reported per target.
    pub async fn broadcast(&self, targets: &[String], command: &str) -> Vec<BroadcastOutcome> {
        let calls = targets.iter().map(|target| async move {
            match self.exec(target, command).await {
                Ok(output) => BroadcastOutcome {
                    container_name: target.clone(),
                    status: OutcomeStatus::Fulfilled,
                    output,
                },
                Err(e) => {
                    tracing::warn!("Broadcast of '{}' to {} failed: {}", command, target, e);
                    BroadcastOutcome {
                        container_name: target.clone(),
                        status: OutcomeStatus::Rejected,
                        output: e.to_string(),
                    }
                }
            }
        });
        join_all(calls).await
    }
}

/// Parse `ListPlayers` output. Banner and noise lines are skipped.
pub fn parse_player_list(output: &str) -> Vec<OnlinePlayer> {
    let output = output.trim();
    if output.is_empty() || output.starts_with(NO_PLAYERS) {
        return Vec::new();
    }

    output
        .lines()
        .filter_map(|line| PLAYER_LINE.captures(line))
        .map(|caps| OnlinePlayer {
            display_name: caps[1].trim().to_string(),
            external_id: caps[2].to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_players_sentinel_is_empty_list() {
        assert!(parse_player_list("No Players Connected").is_empty());
        assert!(parse_player_list("   ").is_empty());
    }

    #[test]
    fn parses_player_lines_and_skips_noise() {
        let output = "Players online:\n\
                      0. Survivor Bob, 0002a1b2c3d4e5f60718293a4b5c6d7e\n\
                      garbage line\n\
                      1. Alice,  ffffffffffffffffffffffffffffffff\n";
        let players = parse_player_list(output);
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].display_name, "Survivor Bob");
        assert_eq!(players[0].external_id, "0002a1b2c3d4e5f60718293a4b5c6d7e");
        assert_eq!(players[1].display_name, "Alice");
    }

    #[test]
    fn rejects_uppercase_or_short_ids() {
        assert!(parse_player_list("0. Bob, 0002A1B2C3D4E5F60718293A4B5C6D7E").is_empty());
        assert!(parse_player_list("0. Bob, abc123").is_empty());
    }
}
