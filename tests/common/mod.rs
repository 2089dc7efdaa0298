#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use clusterd::cluster::compose::ComposeRenderer;
use clusterd::container::engine::{
    ByteStream, ContainerSummary, DaemonClient, LogRequest, PowerAction, SharedDaemon,
};
use clusterd::container::frame::encode_frame;
use clusterd::{Error, Result};

pub const PLAYER_ID: &str = "0002a1b2c3d4e5f60718293a4b5c6d7e";

/// In-memory daemon. Output is served in the multiplexed wire format, split
/// into small chunks so decoding crosses frame boundaries.
#[derive(Default)]
pub struct MockDaemon {
    pub containers: Vec<ContainerSummary>,
    /// container id -> log text (Err = daemon failure)
    pub logs: HashMap<String, std::result::Result<String, String>>,
    /// container id -> rcon output (Err = daemon failure)
    pub exec_output: HashMap<String, std::result::Result<String, String>>,
    pub exec_calls: Mutex<Vec<(String, Vec<String>)>>,
    pub log_calls: Mutex<Vec<(String, LogRequest)>>,
    pub power_calls: Mutex<Vec<(String, PowerAction)>>,
}

impl MockDaemon {
    pub fn with_container(mut self, name: &str, state: &str, status: &str) -> Self {
        self.containers.push(ContainerSummary {
            id: format!("id-{}", name),
            names: vec![format!("/{}", name)],
            image: "mschnitzer/asa-linux-server:latest".to_string(),
            state: state.to_string(),
            status: status.to_string(),
        });
        self
    }

    pub fn with_logs(mut self, name: &str, text: &str) -> Self {
        self.logs.insert(format!("id-{}", name), Ok(text.to_string()));
        self
    }

    pub fn with_failing_logs(mut self, name: &str) -> Self {
        self.logs
            .insert(format!("id-{}", name), Err("log attach failed".to_string()));
        self
    }

    pub fn with_rcon(mut self, name: &str, output: &str) -> Self {
        self.exec_output
            .insert(format!("id-{}", name), Ok(output.to_string()));
        self
    }

    pub fn with_failing_rcon(mut self, name: &str) -> Self {
        self.exec_output
            .insert(format!("id-{}", name), Err("exec failed".to_string()));
        self
    }

    pub fn exec_count(&self) -> usize {
        self.exec_calls.lock().unwrap().len()
    }

    pub fn log_count(&self) -> usize {
        self.log_calls.lock().unwrap().len()
    }

    fn find(&self, container: &str) -> Option<&ContainerSummary> {
        self.containers
            .iter()
            .find(|c| c.id == container || c.has_name(container))
    }

    fn framed(text: &str) -> ByteStream {
        let framed = encode_frame(1, text.as_bytes());
        let chunks: Vec<Result<Bytes>> = framed
            .chunks(3)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        stream::iter(chunks).boxed()
    }
}

#[async_trait]
impl DaemonClient for MockDaemon {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        Ok(self.containers.clone())
    }

    async fn logs(&self, container: &str, request: LogRequest) -> Result<ByteStream> {
        self.log_calls
            .lock()
            .unwrap()
            .push((container.to_string(), request));
        let summary = self
            .find(container)
            .ok_or_else(|| Error::TargetUnavailable(container.to_string()))?;
        match self.logs.get(&summary.id) {
            Some(Ok(text)) => Ok(Self::framed(text)),
            Some(Err(e)) => Err(Error::Transport(e.clone())),
            None => Ok(Self::framed("")),
        }
    }

    async fn exec(&self, container: &str, cmd: Vec<String>) -> Result<ByteStream> {
        self.exec_calls
            .lock()
            .unwrap()
            .push((container.to_string(), cmd));
        let summary = self
            .find(container)
            .filter(|c| c.state == "running")
            .ok_or_else(|| Error::TargetUnavailable(container.to_string()))?;
        match self.exec_output.get(&summary.id) {
            Some(Ok(text)) => Ok(Self::framed(text)),
            Some(Err(e)) => Err(Error::Transport(e.clone())),
            None => Ok(Self::framed("")),
        }
    }

    async fn power(&self, container: &str, action: PowerAction) -> Result<()> {
        if self.find(container).is_none() {
            return Err(Error::TargetUnavailable(container.to_string()));
        }
        self.power_calls
            .lock()
            .unwrap()
            .push((container.to_string(), action));
        Ok(())
    }
}

pub fn shared(daemon: MockDaemon) -> (Arc<MockDaemon>, SharedDaemon) {
    let daemon = Arc::new(daemon);
    let shared: SharedDaemon = daemon.clone();
    (daemon, shared)
}

/// Compose renderer returning a fixed project.
pub struct StaticProject(pub Value);

#[async_trait]
impl ComposeRenderer for StaticProject {
    async fn render_config(&self) -> Result<Value> {
        Ok(self.0.clone())
    }
}

/// A project with one managed service per name, ports from 7777 up.
pub fn project(names: &[&str]) -> Value {
    let mut services = serde_json::Map::new();
    for (i, name) in names.iter().enumerate() {
        services.insert(
            name.to_string(),
            serde_json::json!({
                "image": "mschnitzer/asa-linux-server:latest",
                "container_name": name,
                "environment": {
                    "SESSION_NAME": format!("Session {}", name),
                    "SERVER_MAP": "TheIsland_WP",
                    "SERVER_PORT": (7777 + i).to_string()
                }
            }),
        );
    }
    serde_json::json!({ "services": services })
}
