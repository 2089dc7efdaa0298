//! Handle to the container runtime daemon.
//!
//! Components never reach for a global client: the entry point constructs one
//! `DaemonClient` and hands it to everything that needs it.

use async_trait::async_trait;
use bollard::container::{
    ListContainersOptions, LogsOptions, RestartContainerOptions, StartContainerOptions,
    StopContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::Docker;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::frame::{encode_log_output, FrameDecoder};
use crate::config::config::DockerConfig;
use crate::error::{Error, Result};

/// Raw daemon output in the multiplexed wire format (or raw for tty sessions).
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// What the daemon reports for one container in a listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerSummary {
    pub id: String,
    /// Names as the daemon reports them, with a leading `/`
    pub names: Vec<String>,
    pub image: String,
    pub state: String,
    /// Free text such as `Up 3 hours (healthy)`
    pub status: String,
}

impl ContainerSummary {
    pub fn has_name(&self, name: &str) -> bool {
        self.names
            .iter()
            .any(|n| n.strip_prefix('/').unwrap_or(n) == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRequest {
    pub follow: bool,
    pub tail: usize,
    pub timestamps: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerAction {
    Start,
    Stop,
    Restart,
}

impl std::str::FromStr for PowerAction {
    type Err = crate::cluster::validate::ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "start" => Ok(PowerAction::Start),
            "stop" => Ok(PowerAction::Stop),
            "restart" => Ok(PowerAction::Restart),
            other => Err(crate::cluster::validate::ValidationError::UnknownAction(
                other.to_string(),
            )),
        }
    }
}

#[async_trait]
pub trait DaemonClient: Send + Sync {
    /// Every container, running or not.
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>>;

    /// stdout+stderr of a container's log, optionally following.
    async fn logs(&self, container: &str, request: LogRequest) -> Result<ByteStream>;

    /// Run `cmd` inside the container without a tty, attached to stdout+stderr.
    async fn exec(&self, container: &str, cmd: Vec<String>) -> Result<ByteStream>;

    async fn power(&self, container: &str, action: PowerAction) -> Result<()>;
}

pub type SharedDaemon = Arc<dyn DaemonClient>;

/// Drain a finite stream and return its decoded text.
pub async fn collect_text(mut stream: ByteStream) -> Result<String> {
    let mut decoder = FrameDecoder::new();
    let mut output = String::new();
    while let Some(chunk) = stream.next().await {
        output.push_str(&decoder.push(&chunk?));
    }
    output.push_str(&decoder.finish());
    Ok(output)
}

/// `DaemonClient` backed by the Docker Engine API.
pub struct BollardDaemon {
    docker: Docker,
}

impl BollardDaemon {
    pub fn connect(config: &DockerConfig) -> Result<Self> {
        let docker = if config.socket_path.is_empty() {
            Docker::connect_with_local_defaults()?
        } else {
            Docker::connect_with_unix(&config.socket_path, 120, bollard::API_DEFAULT_VERSION)?
        };
        Ok(Self { docker })
    }

    pub async fn ping(&self) -> Result<()> {
        self.docker.ping().await?;
        Ok(())
    }
}

#[async_trait]
impl DaemonClient for BollardDaemon {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };
        let containers = self.docker.list_containers(Some(options)).await?;

        Ok(containers
            .into_iter()
            .map(|c| ContainerSummary {
                id: c.id.unwrap_or_default(),
                names: c.names.unwrap_or_default(),
                image: c.image.unwrap_or_default(),
                state: c.state.unwrap_or_default(),
                status: c.status.unwrap_or_default(),
            })
            .collect())
    }

    async fn logs(&self, container: &str, request: LogRequest) -> Result<ByteStream> {
        // surface a missing container now rather than as the first stream item
        self.docker.inspect_container(container, None).await?;

        let options = LogsOptions::<String> {
            follow: request.follow,
            stdout: true,
            stderr: true,
            timestamps: request.timestamps,
            tail: request.tail.to_string(),
            ..Default::default()
        };

        let stream = self
            .docker
            .logs(container, Some(options))
            .map_ok(encode_log_output)
            .map_err(Error::from);
        Ok(stream.boxed())
    }

    async fn exec(&self, container: &str, cmd: Vec<String>) -> Result<ByteStream> {
        let exec = self
            .docker
            .create_exec(
                container,
                CreateExecOptions {
                    cmd: Some(cmd),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    attach_stdin: Some(false),
                    tty: Some(false),
                    ..Default::default()
                },
            )
            .await?;

        match self.docker.start_exec(&exec.id, None).await? {
            StartExecResults::Attached { output, .. } => Ok(output
                .map_ok(encode_log_output)
                .map_err(Error::from)
                .boxed()),
            StartExecResults::Detached => Err(Error::Transport(format!(
                "exec {} on {} started detached",
                exec.id, container
            ))),
        }
    }

    async fn power(&self, container: &str, action: PowerAction) -> Result<()> {
        match action {
            PowerAction::Start => {
                self.docker
                    .start_container(container, None::<StartContainerOptions<String>>)
                    .await?
            }
            PowerAction::Stop => {
                self.docker
                    .stop_container(container, None::<StopContainerOptions>)
                    .await?
            }
            PowerAction::Restart => {
                self.docker
                    .restart_container(container, None::<RestartContainerOptions>)
                    .await?
            }
        }
        Ok(())
    }
}
