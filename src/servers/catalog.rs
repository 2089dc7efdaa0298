//! Managed servers derived from the compose project.
//!
//! `refresh()` renders the project and overwrites the cache file; `list()`
//! only ever reads the cache.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cluster::compose::ComposeRenderer;
use crate::cluster::maps::DEFAULT_MAP;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDefinition {
    /// Compose service key
    pub id: String,
    pub container_name: String,
    pub session_name: String,
    pub map_raw: String,
    #[serde(default)]
    pub port: Option<u16>,
}

/// Service environment as a map, whichever form compose declared it in.
fn service_environment(service: &Value) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    match service.get("environment") {
        Some(Value::Object(map)) => {
            for (key, value) in map {
                let value = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                env.insert(key.clone(), value);
            }
        }
        Some(Value::Array(items)) => {
            for item in items.iter().filter_map(Value::as_str) {
                let (key, value) = item.split_once('=').unwrap_or((item, ""));
                env.insert(key.to_string(), value.to_string());
            }
        }
        _ => {}
    }
    env
}

/// Managed services of a rendered compose project, sorted by service key.
pub fn parse_compose_services(project: &Value, image_pattern: &Regex) -> Vec<ServerDefinition> {
    let Some(services) = project.get("services").and_then(Value::as_object) else {
        return Vec::new();
    };

    let sorted: BTreeMap<&String, &Value> = services.iter().collect();
    sorted
        .into_iter()
        .filter(|(_, service)| {
            service
                .get("image")
                .and_then(Value::as_str)
                .is_some_and(|image| image_pattern.is_match(image))
        })
        .map(|(key, service)| {
            let env = service_environment(service);
            let container_name = service
                .get("container_name")
                .and_then(Value::as_str)
                .unwrap_or(key)
                .to_string();
            ServerDefinition {
                id: key.clone(),
                session_name: env
                    .get("SESSION_NAME")
                    .cloned()
                    .unwrap_or_else(|| container_name.clone()),
                map_raw: env
                    .get("SERVER_MAP")
                    .filter(|m| !m.is_empty())
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_MAP.to_string()),
                port: env.get("SERVER_PORT").and_then(|p| p.trim().parse().ok()),
                container_name,
            }
        })
        .collect()
}

pub struct ServiceCatalog {
    renderer: Arc<dyn ComposeRenderer>,
    cache_file: PathBuf,
    image_pattern: Regex,
}

impl ServiceCatalog {
    pub fn new(
        renderer: Arc<dyn ComposeRenderer>,
        cache_file: impl Into<PathBuf>,
        image_pattern: &str,
    ) -> Result<Self> {
        let image_pattern = Regex::new(image_pattern).map_err(|e| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid managed image pattern: {}", e),
            ))
        })?;
        Ok(Self {
            renderer,
            cache_file: cache_file.into(),
            image_pattern,
        })
    }

    pub async fn refresh(&self) -> Result<Vec<ServerDefinition>> {
        let project = self.renderer.render_config().await?;
        let servers = parse_compose_services(&project, &self.image_pattern);

        if let Some(parent) = self.cache_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.cache_file, serde_json::to_vec_pretty(&servers)?)?;

        tracing::info!("Service catalog refreshed: {} managed servers", servers.len());
        Ok(servers)
    }

    /// Cached servers; empty until the first refresh.
    pub fn list(&self) -> Result<Vec<ServerDefinition>> {
        match std::fs::read(&self.cache_file) {
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// The first server is the cluster's main one.
    pub fn primary(&self) -> Result<Option<ServerDefinition>> {
        Ok(self.list()?.into_iter().next())
    }
}
