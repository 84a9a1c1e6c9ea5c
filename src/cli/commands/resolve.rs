use std::sync::Arc;

use crate::clients::BridgeRegistry;
use crate::config::Config;
use crate::db::Store;
use crate::models::{ContentType, IdentityRecord, MediaType, Provider};
use crate::services::{AnimeMapTable, Resolver};
use crate::telemetry::Telemetry;

#[allow(clippy::too_many_arguments)]
pub async fn cmd_resolve(
    config: &Config,
    media_type: &str,
    tmdb: Option<i32>,
    tvdb: Option<i32>,
    imdb: Option<String>,
    tvmaze: Option<i32>,
    mal: Option<i32>,
    kitsu: Option<i32>,
    anidb: Option<i32>,
    anilist: Option<i32>,
    targets: &[String],
) -> anyhow::Result<()> {
    let media_type: MediaType = media_type.parse()?;
    let targets: Vec<Provider> = targets
        .iter()
        .map(|t| t.parse())
        .collect::<anyhow::Result<_>>()?;

    let mut seeds = IdentityRecord::new(media_type.content_type());
    seeds.tmdb_id = tmdb;
    seeds.tvdb_id = tvdb;
    seeds.imdb_id = imdb;
    seeds.tvmaze_id = tvmaze;
    seeds.mal_id = mal;
    seeds.kitsu_id = kitsu;
    seeds.anidb_id = anidb;
    seeds.anilist_id = anilist;

    let store = Store::new(&config.general.database_path).await?;
    let anime_map = match &config.general.anime_map_path {
        Some(path) => AnimeMapTable::load_from_path(path)?,
        None => AnimeMapTable::load_bundled()?,
    };
    let bridges = BridgeRegistry::from_config(&config.providers)?;

    let resolver = Resolver::new(
        bridges,
        store,
        Arc::new(anime_map),
        Telemetry::disabled(),
        config.cache.ttl_days,
    );

    let record = resolver
        .resolve(
            media_type,
            &seeds,
            (!targets.is_empty()).then_some(targets.as_slice()),
        )
        .await?;

    super::print_record(&record);

    let unresolved: Vec<&str> = [
        (record.tmdb_id.is_none(), "tmdb"),
        (record.tvdb_id.is_none(), "tvdb"),
        (record.imdb_id.is_none(), "imdb"),
        (
            record.tvmaze_id.is_none() && record.content_type == ContentType::Series,
            "tvmaze",
        ),
    ]
    .into_iter()
    .filter_map(|(missing, name)| missing.then_some(name))
    .collect();

    if !unresolved.is_empty() {
        println!("Unresolved: {}", unresolved.join(", "));
    }

    Ok(())
}
