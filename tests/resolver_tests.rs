//! Resolution flow tests against mock provider bridges.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use mapparr::clients::{
    BridgeError, BridgeRegistry, EpisodicDbBridge, EpisodicRemoteIds, FilmDbBridge,
    FilmDbExternalIds, MetaBridge, MetaBridgeIds, ScheduleBridge, ScheduleExternals,
};
use mapparr::db::Store;
use mapparr::models::{ContentType, IdentityRecord, MediaType, Provider};
use mapparr::services::{AnimeMapTable, Resolver};
use mapparr::telemetry::Telemetry;

async fn temp_store() -> Store {
    let path = std::env::temp_dir().join(format!("mapparr-test-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite:{}", path.display()))
        .await
        .expect("failed to open test store")
}

fn empty_anime_map() -> Arc<AnimeMapTable> {
    Arc::new(AnimeMapTable::from_json_bytes(b"[]").unwrap())
}

#[derive(Default)]
struct MockFilmDb {
    external: Option<FilmDbExternalIds>,
    find: Option<i32>,
    calls: AtomicUsize,
}

#[async_trait]
impl FilmDbBridge for MockFilmDb {
    async fn external_ids(
        &self,
        _tmdb_id: i32,
        _content_type: ContentType,
    ) -> Result<FilmDbExternalIds, BridgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.external {
            Some(ids) => Ok(ids.clone()),
            None => Err(BridgeError::NotFound),
        }
    }

    async fn find_by_imdb(
        &self,
        _imdb_id: &str,
        _content_type: ContentType,
    ) -> Result<Option<i32>, BridgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.find)
    }
}

#[derive(Default)]
struct MockEpisodicDb {
    find_by_tmdb: Option<i32>,
    find_by_imdb: Option<i32>,
    extended: Option<EpisodicRemoteIds>,
    always_fail: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl EpisodicDbBridge for MockEpisodicDb {
    async fn find_by_tmdb(&self, _tmdb_id: i32) -> Result<Option<i32>, BridgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.always_fail {
            return Err(BridgeError::Status(504));
        }
        Ok(self.find_by_tmdb)
    }

    async fn find_by_imdb(&self, _imdb_id: &str) -> Result<Option<i32>, BridgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.always_fail {
            return Err(BridgeError::Status(504));
        }
        Ok(self.find_by_imdb)
    }

    async fn extended(
        &self,
        _tvdb_id: i32,
        _content_type: ContentType,
    ) -> Result<EpisodicRemoteIds, BridgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.always_fail {
            return Err(BridgeError::Status(504));
        }
        match &self.extended {
            Some(ids) => Ok(ids.clone()),
            None => Err(BridgeError::NotFound),
        }
    }
}

#[derive(Default)]
struct MockSchedule {
    externals: Option<ScheduleExternals>,
    find_by_imdb: Option<i32>,
    find_by_tvdb: Option<i32>,
    calls: AtomicUsize,
}

#[async_trait]
impl ScheduleBridge for MockSchedule {
    async fn show_externals(&self, _tvmaze_id: i32) -> Result<ScheduleExternals, BridgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.externals {
            Some(ids) => Ok(ids.clone()),
            None => Err(BridgeError::NotFound),
        }
    }

    async fn find_by_imdb(&self, _imdb_id: &str) -> Result<Option<i32>, BridgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.find_by_imdb)
    }

    async fn find_by_tvdb(&self, _tvdb_id: i32) -> Result<Option<i32>, BridgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.find_by_tvdb)
    }
}

#[derive(Default)]
struct MockMetaBridge {
    ids: Option<MetaBridgeIds>,
    calls: AtomicUsize,
}

#[async_trait]
impl MetaBridge for MockMetaBridge {
    async fn ids_by_imdb(
        &self,
        _imdb_id: &str,
        _content_type: ContentType,
    ) -> Result<MetaBridgeIds, BridgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.ids {
            Some(ids) => Ok(ids.clone()),
            None => Err(BridgeError::NotFound),
        }
    }
}

struct Mocks {
    film_db: Arc<MockFilmDb>,
    episodic_db: Arc<MockEpisodicDb>,
    schedule: Arc<MockSchedule>,
    meta_bridge: Arc<MockMetaBridge>,
}

impl Mocks {
    fn registry(&self) -> BridgeRegistry {
        BridgeRegistry::from_parts(
            self.film_db.clone(),
            self.episodic_db.clone(),
            self.schedule.clone(),
            self.meta_bridge.clone(),
        )
    }

    fn total_calls(&self) -> usize {
        self.film_db.calls.load(Ordering::SeqCst)
            + self.episodic_db.calls.load(Ordering::SeqCst)
            + self.schedule.calls.load(Ordering::SeqCst)
            + self.meta_bridge.calls.load(Ordering::SeqCst)
    }
}

fn matrix_mocks() -> Mocks {
    // The Matrix: tmdb 603 -> imdb tt0133093, tvdb 12345 (via episodic find).
    Mocks {
        film_db: Arc::new(MockFilmDb {
            external: Some(FilmDbExternalIds {
                imdb_id: Some("tt0133093".to_string()),
                tvdb_id: None,
            }),
            find: Some(603),
            calls: AtomicUsize::new(0),
        }),
        episodic_db: Arc::new(MockEpisodicDb {
            find_by_tmdb: Some(12345),
            ..Default::default()
        }),
        schedule: Arc::new(MockSchedule::default()),
        meta_bridge: Arc::new(MockMetaBridge::default()),
    }
}

fn resolver_with(store: Store, mocks: &Mocks, anime_map: Arc<AnimeMapTable>) -> Resolver {
    Resolver::new(mocks.registry(), store, anime_map, Telemetry::disabled(), 90)
}

#[tokio::test]
async fn scenario_movie_seed_resolves_and_caches() {
    let store = temp_store().await;
    let mocks = matrix_mocks();
    let resolver = resolver_with(store.clone(), &mocks, empty_anime_map());

    let seeds = IdentityRecord::new(ContentType::Movie).with_tmdb(603);
    let record = resolver
        .resolve(MediaType::Movie, &seeds, Some(&[Provider::Tvdb]))
        .await
        .unwrap();

    assert_eq!(record.tmdb_id, Some(603));
    assert_eq!(record.tvdb_id, Some(12345));
    assert_eq!(record.imdb_id.as_deref(), Some("tt0133093"));

    // A cache row was written and is reachable by a key the seed never had.
    let probe = IdentityRecord::new(ContentType::Movie).with_imdb("tt0133093");
    let cached = store
        .get_identity(ContentType::Movie, &probe, 90)
        .await
        .unwrap()
        .expect("expected a cache row");
    assert_eq!(cached.tmdb_id, Some(603));
    assert_eq!(cached.tvdb_id, Some(12345));
}

#[tokio::test]
async fn scenario_second_lookup_is_served_from_cache() {
    let store = temp_store().await;

    let warm_mocks = matrix_mocks();
    let resolver = resolver_with(store.clone(), &warm_mocks, empty_anime_map());
    let seeds = IdentityRecord::new(ContentType::Movie).with_tmdb(603);
    resolver
        .resolve(MediaType::Movie, &seeds, Some(&[Provider::Tvdb]))
        .await
        .unwrap();

    // Fresh mocks so any bridge traffic on the second call is visible.
    let cold_mocks = matrix_mocks();
    let resolver = resolver_with(store.clone(), &cold_mocks, empty_anime_map());
    let seeds = IdentityRecord::new(ContentType::Movie).with_imdb("tt0133093");
    let record = resolver
        .resolve(MediaType::Movie, &seeds, None)
        .await
        .unwrap();

    assert_eq!(record.tmdb_id, Some(603));
    assert_eq!(record.tvdb_id, Some(12345));
    assert_eq!(record.imdb_id.as_deref(), Some("tt0133093"));
    assert_eq!(cold_mocks.total_calls(), 0, "cache hit must make no bridge calls");
}

#[tokio::test]
async fn resolve_is_idempotent_once_cached() {
    let store = temp_store().await;
    let mocks = matrix_mocks();
    let resolver = resolver_with(store.clone(), &mocks, empty_anime_map());

    let seeds = IdentityRecord::new(ContentType::Movie).with_tmdb(603);
    let first = resolver
        .resolve(MediaType::Movie, &seeds, None)
        .await
        .unwrap();
    let calls_after_first = mocks.total_calls();

    let second = resolver
        .resolve(MediaType::Movie, &seeds, None)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(
        mocks.total_calls(),
        calls_after_first,
        "second resolve must be bridge-free"
    );
}

#[tokio::test]
async fn monotonic_completeness_across_warmed_calls() {
    let store = temp_store().await;
    let mocks = matrix_mocks();
    let resolver = resolver_with(store.clone(), &mocks, empty_anime_map());

    let a = resolver
        .resolve(
            MediaType::Movie,
            &IdentityRecord::new(ContentType::Movie).with_tmdb(603),
            None,
        )
        .await
        .unwrap();

    let b = resolver
        .resolve(
            MediaType::Movie,
            &IdentityRecord::new(ContentType::Movie)
                .with_tmdb(603)
                .with_imdb("tt0133093"),
            None,
        )
        .await
        .unwrap();

    for provider in Provider::GENERAL {
        if a.has(provider) {
            assert!(b.has(provider), "{provider} resolved by A but missing from B");
        }
    }
}

#[tokio::test]
async fn scenario_anime_seed_uses_static_table_only() {
    let store = temp_store().await;
    let mocks = matrix_mocks();

    // Complete cross-reference set for MAL 1, nothing left to bridge.
    let table = AnimeMapTable::from_json_bytes(
        br#"[{"mal_id": 1, "kitsu_id": 1, "anidb_id": 23, "anilist_id": 1,
              "tvdb_id": 76885, "tmdb_id": 30991, "imdb_id": "tt0213338",
              "tvmaze_id": 1505, "type": "series"}]"#,
    )
    .unwrap();

    let resolver = resolver_with(store.clone(), &mocks, Arc::new(table));

    let seeds = IdentityRecord::new(ContentType::Series).with_mal(1);
    let record = resolver
        .resolve(MediaType::Anime, &seeds, None)
        .await
        .unwrap();

    assert_eq!(record.tvdb_id, Some(76885));
    assert_eq!(record.tmdb_id, Some(30991));
    assert_eq!(record.imdb_id.as_deref(), Some("tt0213338"));
    assert_eq!(record.anilist_id, Some(1));
    assert_eq!(mocks.total_calls(), 0, "static table hit must make no bridge calls");

    // Animation results never land in the equivalence cache.
    let probe = IdentityRecord::new(ContentType::Series).with_tvdb(76885);
    assert!(
        store
            .get_identity(ContentType::Series, &probe, 90)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn anime_fall_through_bridges_but_never_caches() {
    let store = temp_store().await;

    // Static row knows the anime ids and tmdb, but no imdb/tvdb.
    let table = AnimeMapTable::from_json_bytes(
        br#"[{"mal_id": 20, "anilist_id": 20, "tmdb_id": 46260, "type": "series"}]"#,
    )
    .unwrap();

    let mocks = Mocks {
        film_db: Arc::new(MockFilmDb {
            external: Some(FilmDbExternalIds {
                imdb_id: Some("tt0409591".to_string()),
                tvdb_id: Some(78857),
            }),
            find: None,
            calls: AtomicUsize::new(0),
        }),
        episodic_db: Arc::new(MockEpisodicDb::default()),
        schedule: Arc::new(MockSchedule::default()),
        meta_bridge: Arc::new(MockMetaBridge::default()),
    };
    let resolver = resolver_with(store.clone(), &mocks, Arc::new(table));

    let seeds = IdentityRecord::new(ContentType::Series).with_mal(20);
    let record = resolver
        .resolve(MediaType::Anime, &seeds, None)
        .await
        .unwrap();

    assert_eq!(record.tmdb_id, Some(46260));
    assert_eq!(record.imdb_id.as_deref(), Some("tt0409591"));
    assert_eq!(record.tvdb_id, Some(78857));
    assert!(mocks.total_calls() > 0, "general ids were missing, walk must run");

    let probe = IdentityRecord::new(ContentType::Series).with_imdb("tt0409591");
    assert!(
        store
            .get_identity(ContentType::Series, &probe, 90)
            .await
            .unwrap()
            .is_none(),
        "bridge-discovered anime refinements are not persisted"
    );
}

#[tokio::test]
async fn scenario_bridge_timeout_leaves_field_unresolved_and_still_caches() {
    let store = temp_store().await;

    let mocks = Mocks {
        film_db: Arc::new(MockFilmDb {
            external: Some(FilmDbExternalIds {
                imdb_id: Some("tt0903747".to_string()),
                tvdb_id: None,
            }),
            find: None,
            calls: AtomicUsize::new(0),
        }),
        // Every episodic-db call times out.
        episodic_db: Arc::new(MockEpisodicDb {
            always_fail: true,
            ..Default::default()
        }),
        schedule: Arc::new(MockSchedule::default()),
        meta_bridge: Arc::new(MockMetaBridge::default()),
    };
    let resolver = resolver_with(store.clone(), &mocks, empty_anime_map());

    let seeds = IdentityRecord::new(ContentType::Series).with_tmdb(1396);
    let record = resolver
        .resolve(MediaType::Series, &seeds, None)
        .await
        .unwrap();

    assert_eq!(record.tmdb_id, Some(1396));
    assert_eq!(record.imdb_id.as_deref(), Some("tt0903747"));
    assert_eq!(record.tvdb_id, None, "timed-out lookups stay unresolved");

    // Two populated fields is enough to be worth remembering.
    let probe = IdentityRecord::new(ContentType::Series).with_imdb("tt0903747");
    let cached = store
        .get_identity(ContentType::Series, &probe, 90)
        .await
        .unwrap()
        .expect("partial record should still be cached");
    assert_eq!(cached.tmdb_id, Some(1396));
}

#[tokio::test]
async fn walk_reaches_earlier_branches_via_later_discoveries() {
    let store = temp_store().await;

    // Seed is tvmaze only; its externals yield imdb, and the meta-bridge
    // then supplies tmdb and tvdb from that imdb id.
    let mocks = Mocks {
        film_db: Arc::new(MockFilmDb::default()),
        episodic_db: Arc::new(MockEpisodicDb {
            extended: Some(EpisodicRemoteIds::default()),
            ..Default::default()
        }),
        schedule: Arc::new(MockSchedule {
            externals: Some(ScheduleExternals {
                imdb_id: Some("tt0944947".to_string()),
                tmdb_id: None,
                tvdb_id: None,
            }),
            ..Default::default()
        }),
        meta_bridge: Arc::new(MockMetaBridge {
            ids: Some(MetaBridgeIds {
                tmdb_id: Some(1399),
                tvdb_id: Some(121361),
            }),
            calls: AtomicUsize::new(0),
        }),
    };
    let resolver = resolver_with(store.clone(), &mocks, empty_anime_map());

    let seeds = IdentityRecord::new(ContentType::Series).with_tvmaze(82);
    let record = resolver
        .resolve(MediaType::Series, &seeds, None)
        .await
        .unwrap();

    assert_eq!(record.imdb_id.as_deref(), Some("tt0944947"));
    assert_eq!(record.tmdb_id, Some(1399));
    assert_eq!(record.tvdb_id, Some(121361));
}

#[tokio::test]
async fn missing_seed_is_an_invalid_argument() {
    let store = temp_store().await;
    let mocks = matrix_mocks();
    let resolver = resolver_with(store, &mocks, empty_anime_map());

    let seeds = IdentityRecord::new(ContentType::Movie);
    let result = resolver.resolve(MediaType::Movie, &seeds, None).await;

    assert!(result.is_err());
    assert_eq!(mocks.total_calls(), 0);
}
