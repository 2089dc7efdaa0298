//! `docker compose` invocations for the cluster project.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;
use tokio::process::Command;

use super::validate::ValidationError;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComposeAction {
    Up,
    Down,
}

impl FromStr for ComposeAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "up" => Ok(ComposeAction::Up),
            "down" => Ok(ComposeAction::Down),
            other => Err(ValidationError::UnknownAction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeOutput {
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u128,
}

/// Source of the rendered compose project, as JSON.
#[async_trait]
pub trait ComposeRenderer: Send + Sync {
    async fn render_config(&self) -> Result<serde_json::Value>;
}

pub struct ComposeCli {
    compose_file: PathBuf,
    cwd: PathBuf,
}

impl ComposeCli {
    pub fn new(compose_file: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            compose_file: compose_file.into(),
            cwd: cwd.into(),
        }
    }

    async fn docker_compose(&self, args: &[&str]) -> Result<ComposeOutput> {
        let started = Instant::now();
        let output = Command::new("docker")
            .arg("compose")
            .arg("-f")
            .arg(&self.compose_file)
            .args(args)
            .current_dir(&self.cwd)
            .output()
            .await?;

        let result = ComposeOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration_ms: started.elapsed().as_millis(),
        };
        if !output.status.success() {
            return Err(Error::Command(format!(
                "docker compose {} failed ({}): {}",
                args.join(" "),
                output.status,
                result.stderr.trim()
            )));
        }
        Ok(result)
    }

    pub async fn run(&self, action: ComposeAction) -> Result<ComposeOutput> {
        let args: &[&str] = match action {
            ComposeAction::Up => &["up", "-d"],
            ComposeAction::Down => &["down"],
        };
        tracing::info!("Running docker compose {}", args.join(" "));
        let output = self.docker_compose(args).await?;
        tracing::info!("docker compose {} finished in {}ms", args[0], output.duration_ms);
        Ok(output)
    }
}

#[async_trait]
impl ComposeRenderer for ComposeCli {
    async fn render_config(&self) -> Result<serde_json::Value> {
        let output = self.docker_compose(&["config", "--format", "json"]).await?;
        Ok(serde_json::from_str(&output.stdout)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_actions() {
        assert_eq!("up".parse::<ComposeAction>(), Ok(ComposeAction::Up));
        assert_eq!("down".parse::<ComposeAction>(), Ok(ComposeAction::Down));
        assert!("restart".parse::<ComposeAction>().is_err());
    }

    #[tokio::test]
    async fn missing_compose_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cli = ComposeCli::new(dir.path().join("missing.yml"), dir.path());
        assert!(cli.render_config().await.is_err());
    }
}
