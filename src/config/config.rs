use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub rcon: RconConfig,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DockerConfig {
    /// Empty means bollard's local defaults (DOCKER_HOST or /var/run/docker.sock)
    #[serde(default)]
    pub socket_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Directory holding compose.yml and the env layers
    pub dir: PathBuf,
    /// Shared directory where the cluster scripts drop lock and flag files
    pub signal_dir: PathBuf,
    /// Regex matched against a compose service's image reference
    pub managed_image_pattern: String,
    pub cache_file: PathBuf,
    pub profiles_db: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RconConfig {
    /// Binary inside the game container that relays `rcon <command>`
    pub entrypoint: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogsConfig {
    /// Historical lines replayed when a log stream is opened
    pub tail: usize,
    /// Lines inspected for the shutdown announcement
    pub status_tail: usize,
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/cluster"),
            signal_dir: PathBuf::from("/cluster/signals"),
            managed_image_pattern: "asa-linux-server".to_string(),
            cache_file: PathBuf::from("/data/servers.json"),
            profiles_db: PathBuf::from("/data/profiles.db"),
        }
    }
}

impl Default for RconConfig {
    fn default() -> Self {
        Self {
            entrypoint: "manager".to_string(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            tail: 1000,
            status_tail: 20,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            server: ServerConfig::default(),
            docker: DockerConfig::default(),
            cluster: ClusterConfig::default(),
            rcon: RconConfig::default(),
            logs: LogsConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> crate::error::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn get_version(&self) -> &str {
        &self.version
    }
}

impl ClusterConfig {
    pub fn compose_file(&self) -> PathBuf {
        self.dir.join("compose.yml")
    }

    /// Base layer shipped with the cluster
    pub fn default_env_file(&self) -> PathBuf {
        self.dir.join("default.cluster")
    }

    /// User override layer
    pub fn override_env_file(&self) -> PathBuf {
        self.dir.join(".cluster")
    }

    /// Computed base + override layer read by the containers at start
    pub fn effective_env_file(&self) -> PathBuf {
        self.dir.join(".cluster.effective")
    }

    /// Infrastructure settings read by compose
    pub fn infra_env_file(&self) -> PathBuf {
        self.dir.join(".env")
    }

    pub fn sample_env_file(&self) -> PathBuf {
        self.dir.join(".env.sample")
    }

    pub fn dynamic_config_file(&self) -> PathBuf {
        self.dir.join("web").join("dynamicconfig.ini")
    }

    pub fn server_config_dir(&self) -> PathBuf {
        self.dir.join("server")
    }
}
