//! Equivalence cache store properties: multi-key indexing, fill-if-empty
//! upserts, TTL expiry, and size-cap eviction.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use mapparr::config::CacheConfig;
use mapparr::db::Store;
use mapparr::entities::id_map;
use mapparr::models::{ContentType, IdentityRecord};
use mapparr::services::MaintenanceService;

async fn temp_store() -> Store {
    let path = std::env::temp_dir().join(format!("mapparr-test-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite:{}", path.display()))
        .await
        .expect("failed to open test store")
}

async fn row_count(store: &Store) -> u64 {
    id_map::Entity::find().count(&store.conn).await.unwrap()
}

/// Rewrites `updated_at` for the row holding `imdb_id`, simulating age.
async fn backdate(store: &Store, imdb_id: &str, days: i64) {
    let stamp = (chrono::Utc::now() - chrono::Duration::days(days)).to_rfc3339();
    let touched = id_map::Entity::update_many()
        .col_expr(id_map::Column::UpdatedAt, Expr::value(stamp))
        .filter(id_map::Column::ImdbId.eq(imdb_id))
        .exec(&store.conn)
        .await
        .unwrap()
        .rows_affected;
    assert_eq!(touched, 1);
}

fn movie(tmdb: i32, imdb: &str) -> IdentityRecord {
    IdentityRecord::new(ContentType::Movie)
        .with_tmdb(tmdb)
        .with_imdb(imdb)
}

#[tokio::test]
async fn any_populated_key_resolves_the_same_row() {
    let store = temp_store().await;

    let record = IdentityRecord::new(ContentType::Movie)
        .with_tmdb(603)
        .with_tvdb(12345)
        .with_imdb("tt0133093");
    store.put_identity(&record).await.unwrap();

    let by_tmdb = IdentityRecord::new(ContentType::Movie).with_tmdb(603);
    let by_tvdb = IdentityRecord::new(ContentType::Movie).with_tvdb(12345);
    let by_imdb = IdentityRecord::new(ContentType::Movie).with_imdb("tt0133093");

    for probe in [by_tmdb, by_tvdb, by_imdb] {
        let hit = store
            .get_identity(ContentType::Movie, &probe, 90)
            .await
            .unwrap()
            .expect("every key must resolve the row");
        assert_eq!(hit.tmdb_id, Some(603));
        assert_eq!(hit.tvdb_id, Some(12345));
        assert_eq!(hit.imdb_id.as_deref(), Some("tt0133093"));
    }

    assert_eq!(row_count(&store).await, 1);
}

#[tokio::test]
async fn content_type_partitions_the_keyspace() {
    let store = temp_store().await;

    store.put_identity(&movie(603, "tt0133093")).await.unwrap();

    let probe = IdentityRecord::new(ContentType::Series).with_tmdb(603);
    assert!(
        store
            .get_identity(ContentType::Series, &probe, 90)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn put_rejects_single_field_records() {
    let store = temp_store().await;

    let lonely = IdentityRecord::new(ContentType::Movie).with_tmdb(603);
    store.put_identity(&lonely).await.unwrap();

    assert_eq!(row_count(&store).await, 0, "one identifier has no correlation value");
}

#[tokio::test]
async fn put_never_downgrades_populated_fields() {
    let store = temp_store().await;

    let full = IdentityRecord::new(ContentType::Movie)
        .with_tmdb(603)
        .with_tvdb(12345)
        .with_imdb("tt0133093");
    store.put_identity(&full).await.unwrap();

    // Re-put a thinner record for the same title.
    store.put_identity(&movie(603, "tt0133093")).await.unwrap();

    let probe = IdentityRecord::new(ContentType::Movie).with_tmdb(603);
    let hit = store
        .get_identity(ContentType::Movie, &probe, 90)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hit.tvdb_id, Some(12345), "stored fields must survive a thinner re-put");
    assert_eq!(row_count(&store).await, 1);
}

#[tokio::test]
async fn overlapping_put_merges_into_one_row() {
    let store = temp_store().await;

    store.put_identity(&movie(603, "tt0133093")).await.unwrap();

    // Same title seen again, this time with a tvdb id and the same imdb key.
    let refinement = IdentityRecord::new(ContentType::Movie)
        .with_imdb("tt0133093")
        .with_tvdb(12345);
    store.put_identity(&refinement).await.unwrap();

    assert_eq!(row_count(&store).await, 1);

    let probe = IdentityRecord::new(ContentType::Movie).with_tvdb(12345);
    let hit = store
        .get_identity(ContentType::Movie, &probe, 90)
        .await
        .unwrap()
        .expect("newly merged key must be queryable");
    assert_eq!(hit.tmdb_id, Some(603));
}

#[tokio::test]
async fn correction_put_overwrites_fields() {
    let store = temp_store().await;

    store.put_identity(&movie(603, "tt0133093")).await.unwrap();

    // Operator fixes a bad tmdb id through the correction path.
    let fix = IdentityRecord::new(ContentType::Movie)
        .with_imdb("tt0133093")
        .with_tmdb(604);
    store.put_identity_correction(&fix).await.unwrap();

    let probe = IdentityRecord::new(ContentType::Movie).with_imdb("tt0133093");
    let hit = store
        .get_identity(ContentType::Movie, &probe, 90)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hit.tmdb_id, Some(604));
}

#[tokio::test]
async fn expired_rows_are_misses_and_get_removed() {
    let store = temp_store().await;

    store.put_identity(&movie(603, "tt0133093")).await.unwrap();
    backdate(&store, "tt0133093", 91).await;

    let probe = IdentityRecord::new(ContentType::Movie).with_tmdb(603);
    assert!(
        store
            .get_identity(ContentType::Movie, &probe, 90)
            .await
            .unwrap()
            .is_none(),
        "a row past TTL is a miss"
    );

    let removed = store.expire_identities(90).await.unwrap();
    assert_eq!(removed, 1);
    assert_eq!(row_count(&store).await, 0);
}

#[tokio::test]
async fn fresh_rows_survive_expiry() {
    let store = temp_store().await;

    store.put_identity(&movie(603, "tt0133093")).await.unwrap();
    store.put_identity(&movie(604, "tt0234215")).await.unwrap();
    backdate(&store, "tt0133093", 91).await;

    let removed = store.expire_identities(90).await.unwrap();
    assert_eq!(removed, 1);

    let probe = IdentityRecord::new(ContentType::Movie).with_imdb("tt0234215");
    assert!(
        store
            .get_identity(ContentType::Movie, &probe, 90)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn scenario_size_cap_evicts_exactly_the_oldest() {
    let store = temp_store().await;

    store.put_identity(&movie(1, "tt0000001")).await.unwrap();
    store.put_identity(&movie(2, "tt0000002")).await.unwrap();
    store.put_identity(&movie(3, "tt0000003")).await.unwrap();

    // Distinct ages: row 1 oldest, row 3 newest.
    backdate(&store, "tt0000001", 10).await;
    backdate(&store, "tt0000002", 5).await;

    let removed = store.enforce_cache_size(2).await.unwrap();
    assert_eq!(removed, 1);
    assert_eq!(row_count(&store).await, 2);

    let oldest = IdentityRecord::new(ContentType::Movie).with_imdb("tt0000001");
    assert!(
        store
            .get_identity(ContentType::Movie, &oldest, 90)
            .await
            .unwrap()
            .is_none(),
        "exactly the oldest-updated row must be evicted"
    );
    for survivor in ["tt0000002", "tt0000003"] {
        let probe = IdentityRecord::new(ContentType::Movie).with_imdb(survivor);
        assert!(
            store
                .get_identity(ContentType::Movie, &probe, 90)
                .await
                .unwrap()
                .is_some()
        );
    }
}

#[tokio::test]
async fn enforce_size_is_a_noop_under_the_cap() {
    let store = temp_store().await;

    store.put_identity(&movie(1, "tt0000001")).await.unwrap();
    let removed = store.enforce_cache_size(2).await.unwrap();
    assert_eq!(removed, 0);
    assert_eq!(row_count(&store).await, 1);
}

#[tokio::test]
async fn optimize_pass_composes_expiry_and_eviction() {
    let store = temp_store().await;

    store.put_identity(&movie(1, "tt0000001")).await.unwrap();
    store.put_identity(&movie(2, "tt0000002")).await.unwrap();
    store.put_identity(&movie(3, "tt0000003")).await.unwrap();
    backdate(&store, "tt0000001", 120).await;
    backdate(&store, "tt0000002", 10).await;

    let maintenance = MaintenanceService::new(
        store.clone(),
        CacheConfig {
            ttl_days: 90,
            max_size: 1,
        },
    );

    let report = maintenance.optimize().await.unwrap();
    assert_eq!(report.expired, 1);
    assert_eq!(report.evicted, 1);
    assert_eq!(row_count(&store).await, 1);

    let probe = IdentityRecord::new(ContentType::Movie).with_imdb("tt0000003");
    assert!(
        store
            .get_identity(ContentType::Movie, &probe, 90)
            .await
            .unwrap()
            .is_some(),
        "the newest row wins the optimize pass"
    );
}

#[tokio::test]
async fn search_matches_numeric_and_imdb_keys() {
    let store = temp_store().await;

    store.put_identity(&movie(603, "tt0133093")).await.unwrap();

    let by_number = store
        .search_identities("603", None, 10, 0)
        .await
        .unwrap();
    assert_eq!(by_number.len(), 1);

    let by_imdb = store
        .search_identities("tt0133093", Some(ContentType::Movie), 10, 0)
        .await
        .unwrap();
    assert_eq!(by_imdb.len(), 1);

    let nothing = store.search_identities("999999", None, 10, 0).await.unwrap();
    assert!(nothing.is_empty());
}

#[tokio::test]
async fn stats_and_clear_all() {
    let store = temp_store().await;

    store.put_identity(&movie(1, "tt0000001")).await.unwrap();
    store.put_identity(&movie(2, "tt0000002")).await.unwrap();

    let stats = store.cache_stats().await.unwrap();
    assert_eq!(stats.rows, 2);
    assert!(stats.oldest_updated_at.is_some());

    let removed = store.clear_cache().await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(store.cache_stats().await.unwrap().rows, 0);
}
