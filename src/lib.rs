pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;
pub mod models;
pub mod scheduler;
pub mod services;
pub mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use clients::BridgeRegistry;
pub use config::Config;
use db::Store;
use scheduler::Scheduler;
use services::{AnimeMapTable, MaintenanceService, Resolver};
use telemetry::Telemetry;

/// Everything a running instance needs, wired once from config. The static
/// mapping table is loaded here, before any resolution work is accepted.
pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub resolver: Arc<Resolver>,
    pub maintenance: Arc<MaintenanceService>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::new(&config.general.database_path).await?;
        store.ping().await?;

        let anime_map = match &config.general.anime_map_path {
            Some(path) => AnimeMapTable::load_from_path(path)
                .context("Failed to load operator-supplied anime mapping dataset")?,
            None => AnimeMapTable::load_bundled()?,
        };

        let bridges = BridgeRegistry::from_config(&config.providers)?;

        let telemetry = if config.telemetry.enabled {
            Telemetry::spawn(config.telemetry.buffer_size)
        } else {
            Telemetry::disabled()
        };

        let resolver = Arc::new(Resolver::new(
            bridges,
            store.clone(),
            Arc::new(anime_map),
            telemetry,
            config.cache.ttl_days,
        ));

        let maintenance = Arc::new(MaintenanceService::new(store.clone(), config.cache.clone()));

        Ok(Self {
            config,
            store,
            resolver,
            maintenance,
        })
    }
}

/// Daemon entry point: config, state, maintenance scheduler, clean shutdown.
pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting mapparr");

    let state = AppState::new(config).await?;
    info!("Resolver ready");

    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&state.maintenance),
        state.config.scheduler.clone(),
    ));

    let scheduler_task = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move {
            if let Err(e) = scheduler.start().await {
                error!("Scheduler stopped with error: {}", e);
            }
        })
    };

    signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    scheduler.stop().await;
    scheduler_task.abort();

    info!("Goodbye");
    Ok(())
}
