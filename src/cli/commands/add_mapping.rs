use crate::config::Config;
use crate::db::Store;
use crate::models::IdentityRecord;

/// Manual correction entry point. Unlike the resolution path, fields given
/// here are allowed to overwrite non-null values in the matched row.
pub async fn cmd_add_mapping(
    config: &Config,
    content_type: &str,
    tmdb: Option<i32>,
    tvdb: Option<i32>,
    imdb: Option<String>,
    tvmaze: Option<i32>,
) -> anyhow::Result<()> {
    let mut record = IdentityRecord::new(content_type.parse()?);
    record.tmdb_id = tmdb;
    record.tvdb_id = tvdb;
    record.imdb_id = imdb;
    record.tvmaze_id = tvmaze;

    if record.general_id_count() < 2 {
        anyhow::bail!("A mapping needs at least two identifiers to be worth storing");
    }

    let store = Store::new(&config.general.database_path).await?;
    store.put_identity_correction(&record).await?;

    println!("Mapping stored.");
    super::print_record(&record);
    Ok(())
}
