//! Background maintenance scheduling.
//!
//! Runs the cache optimize pass on a cron expression when one is configured,
//! or on a fixed interval otherwise. The `running` flag lets the daemon stop
//! the loop cleanly on shutdown.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::services::MaintenanceService;

pub struct Scheduler {
    maintenance: Arc<MaintenanceService>,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(maintenance: Arc<MaintenanceService>, config: SchedulerConfig) -> Self {
        Self {
            maintenance,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        if let Some(cron_expr) = self.config.cron_expression.clone() {
            self.run_with_cron(&cron_expr).await
        } else {
            self.run_with_interval().await
        }
    }

    pub async fn stop(&self) {
        *self.running.write().await = false;
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let maintenance = Arc::clone(&self.maintenance);
        let running = Arc::clone(&self.running);

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let maintenance = Arc::clone(&maintenance);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                match maintenance.optimize().await {
                    Ok(report) => info!(
                        expired = report.expired,
                        evicted = report.evicted,
                        "Scheduled cache optimize finished"
                    ),
                    Err(e) => error!("Scheduled cache optimize failed: {}", e),
                }
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Scheduler running with cron: {}", cron_expr);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let interval_hours = self.config.interval_hours;

        info!("Scheduler running every {} hours", interval_hours);

        let mut optimize_interval = interval(Duration::from_secs(interval_hours * 60 * 60));
        // The first tick fires immediately; skip it so startup stays cheap.
        optimize_interval.tick().await;

        loop {
            optimize_interval.tick().await;
            if !*self.running.read().await {
                break;
            }
            match self.maintenance.optimize().await {
                Ok(report) => info!(
                    expired = report.expired,
                    evicted = report.evicted,
                    "Scheduled cache optimize finished"
                ),
                Err(e) => error!("Scheduled cache optimize failed: {}", e),
            }
        }

        Ok(())
    }
}
