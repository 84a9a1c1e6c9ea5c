use crate::config::Config;
use crate::db::Store;

pub async fn cmd_clear(config: &Config, older_than: Option<i64>, all: bool) -> anyhow::Result<()> {
    if !all && older_than.is_none() {
        anyhow::bail!("Pass --all or --older-than <days>");
    }

    let store = Store::new(&config.general.database_path).await?;

    let removed = if all {
        store.clear_cache().await?
    } else {
        // Clearing rows older than N days is the TTL expiry with an ad-hoc TTL.
        store.expire_identities(older_than.unwrap_or(0)).await?
    };

    println!("Removed {removed} cache rows.");
    Ok(())
}
