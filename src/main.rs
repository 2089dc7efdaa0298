use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::time::Instant;

use clusterd::cluster::compose::ComposeCli;
use clusterd::config::config::Config;
use clusterd::container::engine::BollardDaemon;
use clusterd::daemon;
use clusterd::players::profiles::PlayerProfiles;
use clusterd::servers::{catalog::ServiceCatalog, list};
use clusterd::{create_app, AppState};

#[derive(Parser)]
#[command(name = "clusterd")]
#[command(about = "Control daemon for a compose-managed game server cluster", long_about = None)]
struct Cli {
    #[arg(long = "config", default_value = "config.json")]
    config: String,

    /// Debug level logging
    #[arg(long = "dev")]
    dev: bool,

    /// Re-read the compose project into the service catalog and exit
    #[arg(long = "refresh")]
    refresh: bool,

    /// Print the cached service catalog, optionally at a given page
    #[arg(long = "servers", num_args = 0..=1, value_name = "PAGE")]
    servers: Option<Option<i64>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let started = Instant::now();
    let cli = Cli::parse();

    let level = if cli.dev {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config))?;

    let compose = Arc::new(ComposeCli::new(config.cluster.compose_file(), &config.cluster.dir));

    if let Some(page) = cli.servers {
        let catalog = ServiceCatalog::new(
            compose,
            &config.cluster.cache_file,
            &config.cluster.managed_image_pattern,
        )?;
        list::list_servers(&catalog, page.unwrap_or(1));
        return Ok(());
    }

    if cli.refresh {
        let catalog = ServiceCatalog::new(
            compose,
            &config.cluster.cache_file,
            &config.cluster.managed_image_pattern,
        )?;
        let servers = catalog.refresh().await.context("Catalog refresh failed")?;
        println!("Cached {} managed servers", servers.len());
        return Ok(());
    }

    run_daemon(config, compose, started).await
}

async fn run_daemon(config: Config, compose: Arc<ComposeCli>, started: Instant) -> anyhow::Result<()> {
    daemon::start::print_banner(&config);
    daemon::start::check_storage(&config)
        .await
        .context("Storage error! Please double check the config.json")?;

    let bollard = BollardDaemon::connect(&config.docker).context("Failed to connect to Docker")?;
    if let Err(e) = bollard.ping().await {
        eprintln!("✗ Docker Error: {}", e);
        eprintln!("  Please ensure the Docker daemon is running and try again.");
        return Err(e.into());
    }

    let profiles = PlayerProfiles::open(&config.cluster.profiles_db)
        .context("Failed to open player profiles")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, Arc::new(bollard), compose, profiles)?;

    match state.catalog.list() {
        Ok(servers) if servers.is_empty() => {
            tracing::info!("Service catalog is empty, reading compose project");
            state.refresh_catalog_quietly().await;
        }
        Ok(servers) => tracing::info!("Service catalog has {} managed servers", servers.len()),
        Err(e) => tracing::warn!("Service catalog unreadable: {}", e),
    }

    let app = create_app(state);

    println!("Total startup time: {}ms\n", started.elapsed().as_millis());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
