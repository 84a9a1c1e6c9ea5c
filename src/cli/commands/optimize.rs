use crate::config::Config;
use crate::db::Store;
use crate::services::MaintenanceService;

pub async fn cmd_optimize(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let maintenance = MaintenanceService::new(store, config.cache.clone());

    let report = maintenance.optimize().await?;
    println!(
        "Optimize finished: {} expired, {} evicted.",
        report.expired, report.evicted
    );
    Ok(())
}
