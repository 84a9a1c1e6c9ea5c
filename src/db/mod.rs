use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::id_map::CacheStats;

use crate::models::{ContentType, IdentityRecord};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn id_map_repo(&self) -> repositories::IdMapRepository {
        repositories::IdMapRepository::new(self.conn.clone())
    }

    pub async fn get_identity(
        &self,
        content_type: ContentType,
        probe: &IdentityRecord,
        ttl_days: i64,
    ) -> Result<Option<IdentityRecord>> {
        self.id_map_repo().get(content_type, probe, ttl_days).await
    }

    pub async fn put_identity(&self, record: &IdentityRecord) -> Result<()> {
        self.id_map_repo().put(record).await
    }

    pub async fn put_identity_correction(&self, record: &IdentityRecord) -> Result<()> {
        self.id_map_repo().put_correction(record).await
    }

    pub async fn search_identities(
        &self,
        identifier: &str,
        content_type: Option<ContentType>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<IdentityRecord>> {
        self.id_map_repo()
            .search(identifier, content_type, limit, offset)
            .await
    }

    pub async fn expire_identities(&self, ttl_days: i64) -> Result<u64> {
        self.id_map_repo().expire(ttl_days).await
    }

    pub async fn enforce_cache_size(&self, max_size: u64) -> Result<u64> {
        self.id_map_repo().enforce_size(max_size).await
    }

    pub async fn cache_housekeeping(&self) -> Result<()> {
        self.id_map_repo().housekeeping().await
    }

    pub async fn cache_stats(&self) -> Result<CacheStats> {
        self.id_map_repo().stats().await
    }

    pub async fn clear_cache(&self) -> Result<u64> {
        self.id_map_repo().clear_all().await
    }
}
