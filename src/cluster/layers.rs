//! Layered cluster environment.
//!
//! `default.cluster` (base, shipped with the cluster) is overlaid by
//! `.cluster` (admin overrides) into `.cluster.effective`, which the game
//! containers read at start. Infrastructure settings and per-unit maps live in
//! the compose `.env`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::envfile::{merge, read_env_file, serialize_env, write_env_file, EnvMap};
use super::schedule::ScheduleValidator;
use super::validate::{
    check_unique_maps, validate_id_list, validate_max_players, validate_option_text,
    validate_password, ValidationError,
};
use crate::config::config::ClusterConfig;
use crate::error::{Error, Result};

/// Infrastructure keys editable in `.env`.
pub const CLUSTER_CONFIG_KEYS: [&str; 6] = [
    "ASA_CLUSTER_ID",
    "ASA_COMPOSE_PROJECT_NAME",
    "ASA_AUTO_BACKUP_ENABLED",
    "ASA_AUTO_BACKUP_CRON_EXPRESSION",
    "ASA_AUTO_UPDATE_ENABLED",
    "ASA_AUTO_UPDATE_CRON_EXPRESSION",
];

/// (enabled flag, cron expression) pairs checked on write
const SCHEDULES: [(&str, &str); 2] = [
    ("ASA_AUTO_BACKUP_ENABLED", "ASA_AUTO_BACKUP_CRON_EXPRESSION"),
    ("ASA_AUTO_UPDATE_ENABLED", "ASA_AUTO_UPDATE_CRON_EXPRESSION"),
];

pub const MAX_UNITS: usize = 10;
pub const SLAVE_PORTS_KEY: &str = "ASA_SLAVE_PORTS";

pub fn unit_map_key(unit: usize) -> String {
    format!("ASA_SERVER_{}_MAP", unit)
}

pub fn unit_port_key(unit: usize) -> String {
    format!("ASA_SERVER_{}_PORT", unit)
}

/// Editable settings as submitted by the admin UI.
///
/// `MAX_PLAYERS` arrives either as a JSON number or a string.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ClusterSettings {
    #[serde(rename = "MAX_PLAYERS", default, skip_serializing_if = "Option::is_none")]
    pub max_players: Option<serde_json::Value>,
    #[serde(rename = "SERVER_PASSWORD", default)]
    pub server_password: Option<String>,
    #[serde(rename = "ARK_ADMIN_PASSWORD", default)]
    pub admin_password: Option<String>,
    #[serde(rename = "MODS", default)]
    pub mods: Option<String>,
    #[serde(rename = "ARK_EXTRA_OPTS", default)]
    pub extra_opts: Option<String>,
    #[serde(rename = "ARK_EXTRA_DASH_OPTS", default)]
    pub extra_dash_opts: Option<String>,
}

impl ClusterSettings {
    /// Settings view of a layer: missing keys stay absent.
    fn from_env(env: &EnvMap) -> Self {
        let get = |key: &str| env.get(key).cloned();
        Self {
            max_players: env
                .get("MAX_PLAYERS")
                .and_then(|v| v.trim().parse::<i64>().ok())
                .map(serde_json::Value::from),
            server_password: get("SERVER_PASSWORD"),
            admin_password: get("ARK_ADMIN_PASSWORD"),
            mods: get("MODS"),
            extra_opts: get("ARK_EXTRA_OPTS"),
            extra_dash_opts: get("ARK_EXTRA_DASH_OPTS"),
        }
    }

    /// Validate every field and produce the override layer.
    ///
    /// Stops at the first rejected field; nothing is written on error.
    pub fn to_overrides(&self) -> std::result::Result<EnvMap, ValidationError> {
        let max_players = match &self.max_players {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) => validate_max_players(s)?,
            Some(other) => validate_max_players(&other.to_string())?,
        };
        let text = |v: &Option<String>| v.clone().unwrap_or_default();

        let mut overrides = EnvMap::new();
        // absent leaves the base value in force
        if let Some(n) = max_players {
            overrides.insert("MAX_PLAYERS".to_string(), n.to_string());
        }
        overrides.insert(
            "SERVER_PASSWORD".to_string(),
            validate_password(&text(&self.server_password), "SERVER_PASSWORD")?,
        );
        overrides.insert(
            "ARK_ADMIN_PASSWORD".to_string(),
            validate_password(&text(&self.admin_password), "ARK_ADMIN_PASSWORD")?,
        );
        overrides.insert("MODS".to_string(), validate_id_list(&text(&self.mods), "MODS")?);
        overrides.insert(
            "ARK_EXTRA_OPTS".to_string(),
            validate_option_text(&text(&self.extra_opts), "ARK_EXTRA_OPTS")?,
        );
        overrides.insert(
            "ARK_EXTRA_DASH_OPTS".to_string(),
            validate_option_text(&text(&self.extra_dash_opts), "ARK_EXTRA_DASH_OPTS")?,
        );
        Ok(overrides)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsView {
    /// Override value if present, otherwise base value
    pub settings: ClusterSettings,
    pub defaults: ClusterSettings,
    pub effective: EnvMap,
}

pub struct ClusterEnv {
    default_file: PathBuf,
    override_file: PathBuf,
    effective_file: PathBuf,
    infra_file: PathBuf,
    sample_file: PathBuf,
    schedules: ScheduleValidator,
}

impl ClusterEnv {
    pub fn new(cluster: &ClusterConfig, schedules: ScheduleValidator) -> Self {
        Self {
            default_file: cluster.default_env_file(),
            override_file: cluster.override_env_file(),
            effective_file: cluster.effective_env_file(),
            infra_file: cluster.infra_env_file(),
            sample_file: cluster.sample_env_file(),
            schedules,
        }
    }

    /// Seed a missing file from `.env.sample`.
    fn ensure_seeded(&self, path: &Path) -> Result<()> {
        if path.exists() {
            return Ok(());
        }
        if !self.sample_file.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!(
                    "Missing {} (and {} not found)",
                    path.display(),
                    self.sample_file.display()
                ),
            )));
        }
        tracing::info!("Seeding {} from {}", path.display(), self.sample_file.display());
        std::fs::copy(&self.sample_file, path)?;
        Ok(())
    }

    pub fn read_base(&self) -> Result<EnvMap> {
        self.ensure_seeded(&self.default_file)?;
        read_env_file(&self.default_file)
    }

    pub fn read_overrides(&self) -> Result<EnvMap> {
        read_env_file(&self.override_file)
    }

    pub fn read_effective(&self) -> Result<EnvMap> {
        read_env_file(&self.effective_file)
    }

    pub fn settings(&self) -> Result<SettingsView> {
        let base = self.read_base()?;
        let overrides = self.read_overrides()?;
        let effective = merge(&base, &overrides);
        Ok(SettingsView {
            settings: ClusterSettings::from_env(&effective),
            defaults: ClusterSettings::from_env(&base),
            effective,
        })
    }

    /// Validate, persist the override layer and regenerate the effective layer.
    pub fn apply_settings(&self, update: &ClusterSettings) -> Result<EnvMap> {
        let overrides = update.to_overrides()?;
        let base = self.read_base()?;

        write_env_file(&self.override_file, &overrides)?;
        let effective = merge(&base, &overrides);
        write_env_file(&self.effective_file, &effective)?;

        tracing::info!("Cluster overrides updated ({} keys)", overrides.len());
        Ok(effective)
    }

    /// Rewrite `.cluster.effective` from the layers on disk.
    pub fn regenerate_effective(&self) -> Result<EnvMap> {
        let base = self.read_base()?;
        let overrides = self.read_overrides()?;
        let effective = merge(&base, &overrides);
        let previous = read_env_file(&self.effective_file)?;
        if previous != effective || !self.effective_file.exists() {
            write_env_file(&self.effective_file, &effective)?;
        }
        Ok(effective)
    }

    pub fn read_cluster_config(&self) -> Result<EnvMap> {
        self.ensure_seeded(&self.infra_file)?;
        read_env_file(&self.infra_file)
    }

    /// Apply infrastructure and per-unit map changes to `.env`.
    pub async fn apply_cluster_config(&self, updates: &EnvMap) -> Result<EnvMap> {
        let mut env = self.read_cluster_config()?;

        let map_keys: Vec<String> = (0..MAX_UNITS).map(unit_map_key).collect();
        for key in updates.keys() {
            if !CLUSTER_CONFIG_KEYS.contains(&key.as_str()) && !map_keys.contains(key) {
                return Err(ValidationError::UnknownKey(key.clone()).into());
            }
        }

        for key in CLUSTER_CONFIG_KEYS {
            if let Some(value) = updates.get(key) {
                env.insert(key.to_string(), validate_option_text(value, key)?);
            }
        }

        for (enabled, expression) in SCHEDULES {
            let is_enabled = env.get(enabled).map(String::as_str) == Some("true");
            if let Some(cron) = updates.get(expression).filter(|c| !c.is_empty()) {
                if is_enabled {
                    self.schedules.check(cron).await?;
                }
            }
        }

        for key in &map_keys {
            match updates.get(key) {
                Some(map) if map.is_empty() => {
                    env.remove(key);
                }
                Some(map) => {
                    env.insert(key.clone(), validate_option_text(map.trim(), key)?);
                }
                None => {}
            }
        }
        check_unique_maps(&env, &map_keys)?;

        env.insert(SLAVE_PORTS_KEY.to_string(), slave_ports(&env));

        write_env_file(&self.infra_file, &env)?;
        tracing::info!("Cluster config updated");
        Ok(env)
    }

    /// Serialized effective layer, as the containers will read it.
    pub fn render_effective(&self) -> Result<String> {
        Ok(serialize_env(&self.read_effective()?))
    }
}

/// Ports of every secondary unit that has a map, in unit order.
pub fn slave_ports(env: &EnvMap) -> String {
    (1..MAX_UNITS)
        .filter(|unit| env.get(&unit_map_key(*unit)).is_some_and(|m| !m.is_empty()))
        .filter_map(|unit| env.get(&unit_port_key(unit)).filter(|p| !p.is_empty()).cloned())
        .collect::<Vec<_>>()
        .join(",")
}
