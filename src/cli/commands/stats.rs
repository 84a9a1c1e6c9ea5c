use crate::config::Config;
use crate::db::Store;

pub async fn cmd_stats(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let stats = store.cache_stats().await?;

    println!("Equivalence cache");
    println!("{:-<50}", "");
    println!("Rows:    {}", stats.rows);
    println!(
        "Oldest:  {}",
        stats.oldest_updated_at.as_deref().unwrap_or("-")
    );
    println!(
        "Newest:  {}",
        stats.newest_updated_at.as_deref().unwrap_or("-")
    );
    println!(
        "Limits:  ttl {} days, max {} rows",
        config.cache.ttl_days, config.cache.max_size
    );

    Ok(())
}
