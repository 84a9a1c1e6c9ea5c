//! Equivalence cache repository.
//!
//! One logical record per title, addressable by any of its populated
//! identifier columns. Writes are fill-if-empty upserts; `updated_at` drives
//! both TTL expiry and oldest-first eviction.

use anyhow::Result;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, Statement,
};
use tracing::debug;

use crate::entities::id_map;
use crate::models::{ContentType, IdentityRecord};

pub struct IdMapRepository {
    conn: DatabaseConnection,
}

/// Aggregate numbers for the admin `stats` surface.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub rows: u64,
    pub oldest_updated_at: Option<String>,
    pub newest_updated_at: Option<String>,
}

fn model_to_record(model: &id_map::Model) -> IdentityRecord {
    let content_type = model.content_type.parse().unwrap_or(ContentType::Series);
    IdentityRecord {
        content_type,
        tmdb_id: model.tmdb_id,
        tvdb_id: model.tvdb_id,
        imdb_id: model.imdb_id.clone(),
        tvmaze_id: model.tvmaze_id,
        mal_id: None,
        kitsu_id: None,
        anidb_id: None,
        anilist_id: None,
    }
}

/// The column conditions under which `record` is addressable, one per
/// populated general identifier.
fn key_conditions(record: &IdentityRecord) -> Vec<sea_orm::Condition> {
    let mut conditions = Vec::new();
    if let Some(id) = record.tmdb_id {
        conditions.push(sea_orm::Condition::all().add(id_map::Column::TmdbId.eq(id)));
    }
    if let Some(id) = record.tvdb_id {
        conditions.push(sea_orm::Condition::all().add(id_map::Column::TvdbId.eq(id)));
    }
    if let Some(id) = &record.imdb_id {
        conditions.push(sea_orm::Condition::all().add(id_map::Column::ImdbId.eq(id.clone())));
    }
    if let Some(id) = record.tvmaze_id {
        conditions.push(sea_orm::Condition::all().add(id_map::Column::TvmazeId.eq(id)));
    }
    conditions
}

impl IdMapRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Looks up the cache by every populated identifier in `probe`, returning
    /// the first row whose `updated_at` is still inside the TTL window.
    /// Expired matches are misses.
    pub async fn get(
        &self,
        content_type: ContentType,
        probe: &IdentityRecord,
        ttl_days: i64,
    ) -> Result<Option<IdentityRecord>> {
        let threshold = ttl_threshold(ttl_days);

        for condition in key_conditions(probe) {
            let row = id_map::Entity::find()
                .filter(id_map::Column::ContentType.eq(content_type.as_str()))
                .filter(condition)
                .filter(id_map::Column::UpdatedAt.gte(&threshold))
                .one(&self.conn)
                .await?;

            if let Some(model) = row {
                return Ok(Some(model_to_record(&model)));
            }
        }

        Ok(None)
    }

    /// Fill-if-empty upsert. Records with fewer than two populated general
    /// identifiers carry no correlation value and are dropped without error.
    pub async fn put(&self, record: &IdentityRecord) -> Result<()> {
        if record.general_id_count() < 2 {
            debug!(
                fields = record.general_id_count(),
                "Skipping cache write for under-correlated record"
            );
            return Ok(());
        }

        let now = chrono::Utc::now().to_rfc3339();
        let matches = self.find_matching(record).await?;

        match matches.into_iter().next() {
            Some(existing) => {
                let mut merged = model_to_record(&existing);
                merged.merge_missing(record);

                let mut active: id_map::ActiveModel = existing.into();
                active.tmdb_id = Set(merged.tmdb_id);
                active.tvdb_id = Set(merged.tvdb_id);
                active.imdb_id = Set(merged.imdb_id);
                active.tvmaze_id = Set(merged.tvmaze_id);
                active.updated_at = Set(now);
                id_map::Entity::update(active).exec(&self.conn).await?;
            }
            None => {
                let active = id_map::ActiveModel {
                    content_type: Set(record.content_type.as_str().to_string()),
                    tmdb_id: Set(record.tmdb_id),
                    tvdb_id: Set(record.tvdb_id),
                    imdb_id: Set(record.imdb_id.clone()),
                    tvmaze_id: Set(record.tvmaze_id),
                    created_at: Set(now.clone()),
                    updated_at: Set(now),
                    ..Default::default()
                };
                id_map::Entity::insert(active).exec(&self.conn).await?;
            }
        }

        Ok(())
    }

    /// Correction upsert for operator tooling. Unlike [`Self::put`], fields
    /// given here overwrite whatever the matched row holds.
    pub async fn put_correction(&self, record: &IdentityRecord) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let matches = self.find_matching(record).await?;

        match matches.into_iter().next() {
            Some(existing) => {
                let mut active: id_map::ActiveModel = existing.into();
                if record.tmdb_id.is_some() {
                    active.tmdb_id = Set(record.tmdb_id);
                }
                if record.tvdb_id.is_some() {
                    active.tvdb_id = Set(record.tvdb_id);
                }
                if record.imdb_id.is_some() {
                    active.imdb_id = Set(record.imdb_id.clone());
                }
                if record.tvmaze_id.is_some() {
                    active.tvmaze_id = Set(record.tvmaze_id);
                }
                active.updated_at = Set(now);
                id_map::Entity::update(active).exec(&self.conn).await?;
            }
            None => {
                let active = id_map::ActiveModel {
                    content_type: Set(record.content_type.as_str().to_string()),
                    tmdb_id: Set(record.tmdb_id),
                    tvdb_id: Set(record.tvdb_id),
                    imdb_id: Set(record.imdb_id.clone()),
                    tvmaze_id: Set(record.tvmaze_id),
                    created_at: Set(now.clone()),
                    updated_at: Set(now),
                    ..Default::default()
                };
                id_map::Entity::insert(active).exec(&self.conn).await?;
            }
        }

        Ok(())
    }

    /// All rows reachable from any populated key of `record`, oldest first.
    /// More than one hit means the equivalence classes have drifted apart;
    /// the caller merges into the first and leaves the rest alone.
    async fn find_matching(&self, record: &IdentityRecord) -> Result<Vec<id_map::Model>> {
        let mut seen_ids = Vec::new();
        let mut models = Vec::new();

        for condition in key_conditions(record) {
            let rows = id_map::Entity::find()
                .filter(id_map::Column::ContentType.eq(record.content_type.as_str()))
                .filter(condition)
                .all(&self.conn)
                .await?;
            for model in rows {
                if !seen_ids.contains(&model.id) {
                    seen_ids.push(model.id);
                    models.push(model);
                }
            }
        }

        if models.len() > 1 {
            debug!(
                rows = models.len(),
                "Multiple cache rows match one record; merging into the oldest"
            );
        }

        models.sort_by_key(|m| m.id);
        Ok(models)
    }

    /// Admin search by a single identifier value across every id column.
    pub async fn search(
        &self,
        identifier: &str,
        content_type: Option<ContentType>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<IdentityRecord>> {
        let mut condition = sea_orm::Condition::any().add(id_map::Column::ImdbId.eq(identifier));

        if let Ok(numeric) = identifier.parse::<i32>() {
            condition = condition
                .add(id_map::Column::TmdbId.eq(numeric))
                .add(id_map::Column::TvdbId.eq(numeric))
                .add(id_map::Column::TvmazeId.eq(numeric));
        }

        let mut query = id_map::Entity::find().filter(condition);
        if let Some(ct) = content_type {
            query = query.filter(id_map::Column::ContentType.eq(ct.as_str()));
        }

        let rows = query
            .order_by_desc(id_map::Column::UpdatedAt)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await?;

        Ok(rows.iter().map(model_to_record).collect())
    }

    /// Deletes every row older than the TTL. Returns the number removed.
    pub async fn expire(&self, ttl_days: i64) -> Result<u64> {
        let threshold = ttl_threshold(ttl_days);
        let result = id_map::Entity::delete_many()
            .filter(id_map::Column::UpdatedAt.lt(&threshold))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Deletes oldest-`updated_at` rows until the table is at or under
    /// `max_size`. Returns the number removed.
    pub async fn enforce_size(&self, max_size: u64) -> Result<u64> {
        let count = id_map::Entity::find().count(&self.conn).await?;
        if count <= max_size {
            return Ok(0);
        }

        let excess = count - max_size;
        let victims: Vec<i32> = id_map::Entity::find()
            .order_by_asc(id_map::Column::UpdatedAt)
            .limit(excess)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();

        let result = id_map::Entity::delete_many()
            .filter(id_map::Column::Id.is_in(victims))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Storage-engine housekeeping. Does not change logical contents.
    pub async fn housekeeping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .execute(Statement::from_string(backend, "VACUUM".to_string()))
            .await?;
        self.conn
            .execute(Statement::from_string(backend, "ANALYZE".to_string()))
            .await?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<CacheStats> {
        let rows = id_map::Entity::find().count(&self.conn).await?;
        let oldest = id_map::Entity::find()
            .order_by_asc(id_map::Column::UpdatedAt)
            .one(&self.conn)
            .await?
            .map(|m| m.updated_at);
        let newest = id_map::Entity::find()
            .order_by_desc(id_map::Column::UpdatedAt)
            .one(&self.conn)
            .await?
            .map(|m| m.updated_at);

        Ok(CacheStats {
            rows,
            oldest_updated_at: oldest,
            newest_updated_at: newest,
        })
    }

    pub async fn clear_all(&self) -> Result<u64> {
        let result = id_map::Entity::delete_many().exec(&self.conn).await?;
        Ok(result.rows_affected)
    }
}

fn ttl_threshold(ttl_days: i64) -> String {
    (chrono::Utc::now() - chrono::Duration::days(ttl_days)).to_rfc3339()
}
