mod common;

use std::sync::Arc;

use clusterd::container::rcon::RconBridge;
use clusterd::container::signals::SignalDir;
use clusterd::container::state::{DetailedState, Health};
use clusterd::container::status::{ContainerStateService, SHUTDOWN_ANNOUNCEMENT};
use clusterd::players::profiles::PlayerProfiles;
use clusterd::servers::catalog::ServerDefinition;
use common::{shared, MockDaemon, PLAYER_ID};

fn server(name: &str, port: u16) -> ServerDefinition {
    ServerDefinition {
        id: name.to_string(),
        container_name: name.to_string(),
        session_name: format!("Session {}", name),
        map_raw: "Ragnarok_WP".to_string(),
        port: Some(port),
    }
}

fn service(daemon: MockDaemon, signal_dir: &std::path::Path) -> (Arc<MockDaemon>, ContainerStateService) {
    let (mock, daemon) = shared(daemon);
    let profiles = Arc::new(PlayerProfiles::temporary().unwrap());
    profiles.set_display_name(PLAYER_ID, "Registered Bob").unwrap();
    let rcon = Arc::new(RconBridge::new(daemon.clone(), "manager"));
    let service = ContainerStateService::new(daemon, rcon, profiles, SignalDir::new(signal_dir), 20);
    (mock, service)
}

#[tokio::test]
async fn absent_container_is_not_created_without_daemon_calls() {
    let signals = tempfile::tempdir().unwrap();
    let (mock, service) = service(MockDaemon::default(), signals.path());

    let statuses = service.collect(&[server("asa0", 7777)]).await.unwrap();
    assert_eq!(statuses.len(), 1);
    let status = &statuses[0];
    assert_eq!(status.state, "not_created");
    assert_eq!(status.id, "asa0");
    assert_eq!(status.map, "Ragnarok");
    assert_eq!(status.health, None);
    assert!(!status.is_stopping);
    assert_eq!(status.online_players, None);
    assert_eq!(mock.exec_count(), 0);
    assert_eq!(mock.log_count(), 0);
}

#[tokio::test]
async fn unknown_health_skips_player_enumeration() {
    let signals = tempfile::tempdir().unwrap();
    let daemon = MockDaemon::default()
        .with_container("asa0", "running", "Up 3 hours")
        .with_logs("asa0", "Server ready\n");
    let (mock, service) = service(daemon, signals.path());

    let statuses = service.collect(&[server("asa0", 7777)]).await.unwrap();
    assert_eq!(statuses[0].state, "running");
    assert_eq!(statuses[0].health, None);
    assert_eq!(statuses[0].online_players, None);
    assert_eq!(mock.exec_count(), 0);

    let logs = mock.log_calls.lock().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].1.tail, 20);
    assert!(!logs[0].1.follow);
}

#[tokio::test]
async fn no_players_sentinel_is_an_empty_list() {
    let signals = tempfile::tempdir().unwrap();
    let daemon = MockDaemon::default()
        .with_container("asa0", "running", "Up 3 hours (healthy)")
        .with_rcon("asa0", "No Players Connected\n");
    let (mock, service) = service(daemon, signals.path());

    let statuses = service.collect(&[server("asa0", 7777)]).await.unwrap();
    assert_eq!(statuses[0].health, Some(Health::Healthy));
    assert_eq!(statuses[0].online_players, Some(Vec::new()));

    let calls = mock.exec_calls.lock().unwrap();
    assert_eq!(calls[0].1, vec!["manager", "rcon", "ListPlayers"]);
}

#[tokio::test]
async fn registered_names_replace_in_game_names() {
    let signals = tempfile::tempdir().unwrap();
    let output = format!(
        "0. bob_ingame, {}\n1. Alice, ffffffffffffffffffffffffffffffff\n",
        PLAYER_ID
    );
    let daemon = MockDaemon::default()
        .with_container("asa0", "running", "Up 1 hour (healthy)")
        .with_rcon("asa0", &output);
    let (_, service) = service(daemon, signals.path());

    let statuses = service.collect(&[server("asa0", 7777)]).await.unwrap();
    let players = statuses[0].online_players.as_ref().unwrap();
    assert_eq!(players.len(), 2);
    assert_eq!(players[0].display_name, "Registered Bob");
    assert_eq!(players[0].external_id, PLAYER_ID);
    assert_eq!(players[1].display_name, "Alice");
}

#[tokio::test]
async fn shutdown_announcement_marks_stopping() {
    let signals = tempfile::tempdir().unwrap();
    let logs = format!("Saving world...\n\x1b[33m{}\x1b[0m\n", SHUTDOWN_ANNOUNCEMENT);
    let daemon = MockDaemon::default()
        .with_container("asa0", "running", "Up 5 hours (unhealthy)")
        .with_logs("asa0", &logs);
    let (mock, service) = service(daemon, signals.path());

    let statuses = service.collect(&[server("asa0", 7777)]).await.unwrap();
    assert!(statuses[0].is_stopping);
    assert_eq!(statuses[0].health, Some(Health::Unhealthy));
    assert_eq!(mock.exec_count(), 0);
}

#[tokio::test]
async fn failing_units_only_lose_optional_fields() {
    let signals = tempfile::tempdir().unwrap();
    let names = ["asa0", "asa1", "asa2", "asa3", "asa4"];
    let mut daemon = MockDaemon::default();
    for name in names {
        daemon = daemon.with_container(name, "running", "Up 2 hours (healthy)");
    }
    let daemon = daemon
        .with_rcon("asa0", "No Players Connected")
        .with_failing_logs("asa1")
        .with_failing_rcon("asa1")
        .with_rcon("asa2", "No Players Connected")
        .with_failing_logs("asa3")
        .with_failing_rcon("asa3")
        .with_rcon("asa4", "No Players Connected");
    let (_, service) = service(daemon, signals.path());

    let servers: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(i, name)| server(name, 7777 + i as u16))
        .collect();
    let statuses = service.collect(&servers).await.unwrap();

    assert_eq!(statuses.len(), 5);
    for (status, name) in statuses.iter().zip(names) {
        assert_eq!(status.name, name);
        assert_eq!(status.state, "running");
        assert_eq!(status.health, Some(Health::Healthy));
        assert!(!status.is_stopping);
    }
    assert_eq!(statuses[0].online_players, Some(Vec::new()));
    assert_eq!(statuses[1].online_players, None);
    assert_eq!(statuses[2].online_players, Some(Vec::new()));
    assert_eq!(statuses[3].online_players, None);
    assert_eq!(statuses[4].online_players, Some(Vec::new()));
}

#[tokio::test]
async fn cluster_signal_overrides_every_unit() {
    let signals = tempfile::tempdir().unwrap();
    std::fs::write(signals.path().join("waiting_7778.flag"), "").unwrap();
    let daemon = MockDaemon::default().with_container("asa0", "exited", "Exited (0) 1 minute ago");
    let (_, service) = service(daemon, signals.path());
    let servers = [server("asa0", 7777), server("asa1", 7778)];

    let statuses = service.collect(&servers).await.unwrap();
    assert_eq!(statuses[0].detailed_state, None);
    assert_eq!(statuses[1].detailed_state, Some(DetailedState::Waiting));
    assert_eq!(statuses[1].state, "not_created");

    std::fs::write(signals.path().join("maintenance.lock"), "").unwrap();
    let statuses = service.collect(&servers).await.unwrap();
    assert!(statuses
        .iter()
        .all(|s| s.detailed_state == Some(DetailedState::Maintenance)));
}

#[tokio::test]
async fn running_containers_ignores_stopped_and_absent() {
    let signals = tempfile::tempdir().unwrap();
    let daemon = MockDaemon::default()
        .with_container("asa0", "running", "Up 1 hour (healthy)")
        .with_container("asa1", "exited", "Exited (0)");
    let (mock, service) = service(daemon, signals.path());
    let servers = [server("asa0", 7777), server("asa1", 7778), server("asa2", 7779)];

    assert_eq!(service.running_containers(&servers).await.unwrap(), vec!["asa0"]);
    assert_eq!(mock.log_count(), 0);
}
