//! HTTP surface. Each submodule builds a router over the shared `AppState`.

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::cluster::compose::{ComposeCli, ComposeRenderer};
use crate::cluster::dynamic::DynamicConfigFile;
use crate::cluster::layers::ClusterEnv;
use crate::cluster::schedule::ScheduleValidator;
use crate::cluster::server_ini::ServerIniFiles;
use crate::config::config::Config;
use crate::container::engine::SharedDaemon;
use crate::container::power::PowerManager;
use crate::container::rcon::RconBridge;
use crate::container::signals::SignalDir;
use crate::container::status::ContainerStateService;
use crate::error::Result;
use crate::players::profiles::PlayerProfiles;
use crate::servers::catalog::ServiceCatalog;

pub mod cluster;
pub mod container;
pub mod players;
pub mod public;
pub mod rcon;
pub mod servers;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub daemon: SharedDaemon,
    pub rcon: Arc<RconBridge>,
    pub status: Arc<ContainerStateService>,
    pub power: Arc<PowerManager>,
    pub catalog: Arc<ServiceCatalog>,
    pub cluster_env: Arc<ClusterEnv>,
    pub compose: Arc<ComposeCli>,
    pub dynamic: Arc<DynamicConfigFile>,
    pub server_ini: Arc<ServerIniFiles>,
    pub profiles: Arc<PlayerProfiles>,
}

impl AppState {
    /// Wire every component around one daemon handle. The compose CLI also
    /// renders the project for the service catalog.
    pub fn new(
        config: Config,
        daemon: SharedDaemon,
        compose: Arc<ComposeCli>,
        profiles: PlayerProfiles,
    ) -> Result<Self> {
        let renderer: Arc<dyn ComposeRenderer> = compose.clone();
        Self::with_renderer(config, daemon, compose, renderer, profiles)
    }

    /// Like [`AppState::new`], with the catalog reading a separate renderer.
    pub fn with_renderer(
        config: Config,
        daemon: SharedDaemon,
        compose: Arc<ComposeCli>,
        renderer: Arc<dyn ComposeRenderer>,
        profiles: PlayerProfiles,
    ) -> Result<Self> {
        let cluster = &config.cluster;
        let profiles = Arc::new(profiles);
        let rcon = Arc::new(RconBridge::new(daemon.clone(), config.rcon.entrypoint.clone()));
        let status = Arc::new(ContainerStateService::new(
            daemon.clone(),
            rcon.clone(),
            profiles.clone(),
            SignalDir::new(&cluster.signal_dir),
            config.logs.status_tail,
        ));
        let catalog = Arc::new(ServiceCatalog::new(
            renderer,
            &cluster.cache_file,
            &cluster.managed_image_pattern,
        )?);

        Ok(Self {
            power: Arc::new(PowerManager::new(daemon.clone())),
            cluster_env: Arc::new(ClusterEnv::new(cluster, ScheduleValidator::default())),
            compose,
            dynamic: Arc::new(DynamicConfigFile::new(cluster.dynamic_config_file())),
            server_ini: Arc::new(ServerIniFiles::new(cluster.server_config_dir())),
            daemon,
            rcon,
            status,
            catalog,
            profiles,
            config: Arc::new(config),
        })
    }

    /// Re-read the compose project after a config write. Failures are logged only.
    pub async fn refresh_catalog_quietly(&self) {
        if let Err(e) = self.catalog.refresh().await {
            tracing::warn!("Service catalog refresh failed: {}", e);
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    public::public_router(state.clone())
        .merge(container::container_router(state.clone()))
        .merge(rcon::rcon_router(state.clone()))
        .merge(servers::servers_router(state.clone()))
        .merge(cluster::cluster_router(state.clone()))
        .merge(players::players_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
