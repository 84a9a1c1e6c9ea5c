//! Cache maintenance.
//!
//! Three idempotent operations over the equivalence cache (TTL expiry,
//! size-cap enforcement, storage housekeeping), individually invokable and
//! composed into one `optimize` pass by the scheduler and the CLI.

use anyhow::Result;
use tracing::{debug, info};

use crate::config::CacheConfig;
use crate::db::Store;

#[derive(Clone)]
pub struct MaintenanceService {
    store: Store,
    config: CacheConfig,
}

/// What one optimize pass removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimizeReport {
    pub expired: u64,
    pub evicted: u64,
}

impl MaintenanceService {
    #[must_use]
    pub const fn new(store: Store, config: CacheConfig) -> Self {
        Self { store, config }
    }

    /// Deletes rows not updated within the configured TTL.
    pub async fn expire(&self) -> Result<u64> {
        let removed = self.store.expire_identities(self.config.ttl_days).await?;
        if removed > 0 {
            info!(
                removed,
                ttl_days = self.config.ttl_days,
                "Expired stale cache rows"
            );
        } else {
            debug!("No cache rows past TTL");
        }
        Ok(removed)
    }

    /// Evicts oldest-updated rows down to the configured cap.
    pub async fn enforce_size(&self) -> Result<u64> {
        let removed = self.store.enforce_cache_size(self.config.max_size).await?;
        if removed > 0 {
            info!(
                removed,
                max_size = self.config.max_size,
                "Evicted cache rows over size cap"
            );
        }
        Ok(removed)
    }

    /// Storage-engine compaction and statistics refresh. Logical contents
    /// are unchanged.
    pub async fn housekeeping(&self) -> Result<()> {
        self.store.cache_housekeeping().await?;
        debug!("Cache housekeeping finished");
        Ok(())
    }

    /// Expiry, then eviction, then housekeeping.
    pub async fn optimize(&self) -> Result<OptimizeReport> {
        let expired = self.expire().await?;
        let evicted = self.enforce_size().await?;
        self.housekeeping().await?;
        Ok(OptimizeReport { expired, evicted })
    }
}
