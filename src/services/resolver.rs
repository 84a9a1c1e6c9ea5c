//! Cross-provider identifier resolution.
//!
//! Given one identifier for a title, fill in the others: anime requests go
//! through the static mapping table, general requests through the
//! equivalence cache and then a sequential, precondition-gated walk over the
//! provider bridges. Bridge failures of any kind leave fields unresolved and
//! never escape [`Resolver::resolve`]; the only propagating error is
//! [`ResolveError::InvalidArgument`] for a caller bug.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::clients::{BridgeError, BridgeRegistry};
use crate::db::Store;
use crate::models::{ContentType, IdentityRecord, MediaType, Provider};
use crate::services::anime_map::AnimeMapTable;
use crate::telemetry::{ResolverEvent, Telemetry};

const SERVICE_FILM_DB: &str = "tmdb";
const SERVICE_EPISODIC_DB: &str = "tvdb";
const SERVICE_SCHEDULE: &str = "tvmaze";
const SERVICE_META_BRIDGE: &str = "meta-bridge";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub struct Resolver {
    bridges: BridgeRegistry,
    store: Store,
    anime_map: Arc<AnimeMapTable>,
    telemetry: Telemetry,
    ttl_days: i64,
}

impl Resolver {
    #[must_use]
    pub const fn new(
        bridges: BridgeRegistry,
        store: Store,
        anime_map: Arc<AnimeMapTable>,
        telemetry: Telemetry,
        ttl_days: i64,
    ) -> Self {
        Self {
            bridges,
            store,
            anime_map,
            telemetry,
            ttl_days,
        }
    }

    /// Resolves `seeds` into the fullest identity record reachable.
    ///
    /// Always returns a record once the arguments are well-formed, possibly
    /// with nothing resolved beyond the seeds.
    pub async fn resolve(
        &self,
        media_type: MediaType,
        seeds: &IdentityRecord,
        targets: Option<&[Provider]>,
    ) -> Result<IdentityRecord, ResolveError> {
        if !seeds.has_any() {
            return Err(ResolveError::InvalidArgument(
                "at least one seed identifier is required".to_string(),
            ));
        }

        let mut record = IdentityRecord::new(media_type.content_type());
        record.merge_missing(seeds);

        if media_type == MediaType::Anime || seeds.has_anime_id() {
            self.resolve_anime(&mut record).await;
            return Ok(record);
        }

        self.resolve_general(&mut record, targets).await;
        Ok(record)
    }

    /// Animation path: the static table is the source of truth. Bridge
    /// refinements for still-missing general ids are returned to the caller
    /// but never written back to the equivalence cache.
    async fn resolve_anime(&self, record: &mut IdentityRecord) {
        if let Some(row) = self.anime_map.lookup(record) {
            self.telemetry.emit(ResolverEvent::StaticTableHit);
            record.merge_missing(&row);
        } else {
            debug!("Anime seed not present in the static mapping table");
        }

        if !record.missing_general().is_empty() && record.general_id_count() > 0 {
            self.bridge_walk(record).await;
        }
    }

    /// General path: cache short-circuit, then the bridge walk, then
    /// write-back of anything worth remembering.
    async fn resolve_general(&self, record: &mut IdentityRecord, targets: Option<&[Provider]>) {
        match self
            .store
            .get_identity(record.content_type, record, self.ttl_days)
            .await
        {
            Ok(Some(cached)) => {
                self.telemetry.emit(ResolverEvent::CacheHit);
                record.merge_missing(&cached);
                if record.satisfies(targets) {
                    return;
                }
            }
            Ok(None) => {
                self.telemetry.emit(ResolverEvent::CacheMiss);
            }
            Err(e) => {
                // Storage trouble costs us the caching benefit, nothing else.
                warn!(error = %e, "Equivalence cache read failed; resolving live");
            }
        }

        self.bridge_walk(record).await;

        if record.general_id_count() >= 2 {
            match self.store.put_identity(record).await {
                Ok(()) => self.telemetry.emit(ResolverEvent::RecordPersisted),
                Err(e) => warn!(error = %e, "Equivalence cache write failed"),
            }
        }
    }

    /// The sequential bridge walk. Branches run in order and only when their
    /// precondition holds; a branch discovered to be runnable by a later
    /// pass (because an earlier branch filled its source id) still gets its
    /// turn, but no branch runs twice.
    async fn bridge_walk(&self, record: &mut IdentityRecord) {
        let mut attempted = [false; 4];

        loop {
            let mut ran_any = false;

            if !attempted[0] && record.tmdb_id.is_some() && !record.missing_general().is_empty() {
                attempted[0] = true;
                ran_any = true;
                self.step_from_tmdb(record).await;
            }

            if !attempted[1] && record.tvdb_id.is_some() && !record.missing_general().is_empty() {
                attempted[1] = true;
                ran_any = true;
                self.step_from_tvdb(record).await;
            }

            if !attempted[2] && record.imdb_id.is_some() && !record.missing_general().is_empty() {
                attempted[2] = true;
                ran_any = true;
                self.step_from_imdb(record).await;
            }

            if !attempted[3] && record.tvmaze_id.is_some() && !record.missing_general().is_empty() {
                attempted[3] = true;
                ran_any = true;
                self.step_from_tvmaze(record).await;
            }

            if !ran_any {
                break;
            }
        }
    }

    /// Branch 1: a known TMDB id yields IMDb (and sometimes TheTVDB) from the
    /// detail record, with the episodic database as the TheTVDB fallback.
    async fn step_from_tmdb(&self, record: &mut IdentityRecord) {
        let Some(tmdb_id) = record.tmdb_id else { return };
        let content_type = record.content_type;

        if record.imdb_id.is_none() || record.tvdb_id.is_none() {
            if let Some(ids) = self
                .bridge_try(SERVICE_FILM_DB, async {
                    self.bridges
                        .film_db
                        .external_ids(tmdb_id, content_type)
                        .await
                })
                .await
            {
                if record.imdb_id.is_none() {
                    record.imdb_id = ids.imdb_id;
                }
                if record.tvdb_id.is_none() {
                    record.tvdb_id = ids.tvdb_id;
                }
            }
        }

        if record.tvdb_id.is_none() {
            if let Some(found) = self
                .bridge_try(SERVICE_EPISODIC_DB, async {
                    self.bridges.episodic_db.find_by_tmdb(tmdb_id).await
                })
                .await
            {
                record.tvdb_id = found;
            }
        }

        if content_type == ContentType::Series
            && record.tvmaze_id.is_none()
            && let Some(tvdb_id) = record.tvdb_id
        {
            if let Some(remote) = self
                .bridge_try(SERVICE_EPISODIC_DB, async {
                    self.bridges
                        .episodic_db
                        .extended(tvdb_id, content_type)
                        .await
                })
                .await
            {
                let found = IdentityRecord {
                    tmdb_id: remote.tmdb_id,
                    imdb_id: remote.imdb_id,
                    tvmaze_id: remote.tvmaze_id,
                    ..IdentityRecord::new(content_type)
                };
                record.merge_missing(&found);
            }
        }
    }

    /// Branch 2: a known TheTVDB id carries a remote-id cross-reference list;
    /// the schedule service backstops a missing TVmaze id.
    async fn step_from_tvdb(&self, record: &mut IdentityRecord) {
        let Some(tvdb_id) = record.tvdb_id else { return };
        let content_type = record.content_type;

        if record.imdb_id.is_none()
            || record.tmdb_id.is_none()
            || (content_type == ContentType::Series && record.tvmaze_id.is_none())
        {
            if let Some(remote) = self
                .bridge_try(SERVICE_EPISODIC_DB, async {
                    self.bridges
                        .episodic_db
                        .extended(tvdb_id, content_type)
                        .await
                })
                .await
            {
                if record.imdb_id.is_none() {
                    record.imdb_id = remote.imdb_id;
                }
                if record.tmdb_id.is_none() {
                    record.tmdb_id = remote.tmdb_id;
                }
                if content_type == ContentType::Series && record.tvmaze_id.is_none() {
                    record.tvmaze_id = remote.tvmaze_id;
                }
            }
        }

        if content_type == ContentType::Series && record.tvmaze_id.is_none() {
            if let Some(found) = self
                .bridge_try(SERVICE_SCHEDULE, async {
                    self.bridges.schedule.find_by_tvdb(tvdb_id).await
                })
                .await
            {
                record.tvmaze_id = found;
            }
        }
    }

    /// Branch 3: a known IMDb id queries the community meta-bridge first,
    /// then falls back to the first-party find endpoints per provider.
    async fn step_from_imdb(&self, record: &mut IdentityRecord) {
        let Some(imdb_id) = record.imdb_id.clone() else {
            return;
        };
        let content_type = record.content_type;

        if record.tmdb_id.is_none() || record.tvdb_id.is_none() {
            if let Some(ids) = self
                .bridge_try(SERVICE_META_BRIDGE, async {
                    self.bridges
                        .meta_bridge
                        .ids_by_imdb(&imdb_id, content_type)
                        .await
                })
                .await
            {
                if record.tmdb_id.is_none() {
                    record.tmdb_id = ids.tmdb_id;
                }
                if record.tvdb_id.is_none() {
                    record.tvdb_id = ids.tvdb_id;
                }
            }
        }

        if record.tmdb_id.is_none() {
            if let Some(found) = self
                .bridge_try(SERVICE_FILM_DB, async {
                    self.bridges
                        .film_db
                        .find_by_imdb(&imdb_id, content_type)
                        .await
                })
                .await
            {
                record.tmdb_id = found;
            }
        }

        if record.tvdb_id.is_none() {
            if let Some(found) = self
                .bridge_try(SERVICE_EPISODIC_DB, async {
                    self.bridges.episodic_db.find_by_imdb(&imdb_id).await
                })
                .await
            {
                record.tvdb_id = found;
            }
        }

        if content_type == ContentType::Series && record.tvmaze_id.is_none() {
            if let Some(found) = self
                .bridge_try(SERVICE_SCHEDULE, async {
                    self.bridges.schedule.find_by_imdb(&imdb_id).await
                })
                .await
            {
                record.tvmaze_id = found;
            }
        }
    }

    /// Branch 4: a known TVmaze id exposes an externals block with the other
    /// three general ids.
    async fn step_from_tvmaze(&self, record: &mut IdentityRecord) {
        let Some(tvmaze_id) = record.tvmaze_id else { return };

        if let Some(externals) = self
            .bridge_try(SERVICE_SCHEDULE, async {
                self.bridges.schedule.show_externals(tvmaze_id).await
            })
            .await
        {
            if record.imdb_id.is_none() {
                record.imdb_id = externals.imdb_id;
            }
            if record.tmdb_id.is_none() {
                record.tmdb_id = externals.tmdb_id;
            }
            if record.tvdb_id.is_none() {
                record.tvdb_id = externals.tvdb_id;
            }
        }
    }

    /// Runs one bridge call, converting every failure into "field remains
    /// unresolved". Upstream "no match" is expected and logged quietly.
    async fn bridge_try<T, F>(&self, service: &'static str, fut: F) -> Option<T>
    where
        F: Future<Output = Result<T, BridgeError>>,
    {
        self.telemetry.emit(ResolverEvent::BridgeCall(service));
        match fut.await {
            Ok(value) => Some(value),
            Err(e) if e.is_not_found() => {
                debug!(service, "Bridge reported no match");
                self.telemetry.emit(ResolverEvent::BridgeFailure(service));
                None
            }
            Err(e) => {
                warn!(service, error = %e, "Bridge call failed; leaving field unresolved");
                self.telemetry.emit(ResolverEvent::BridgeFailure(service));
                None
            }
        }
    }
}
