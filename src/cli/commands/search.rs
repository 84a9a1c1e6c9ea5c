use crate::config::Config;
use crate::db::Store;
use crate::models::ContentType;

pub async fn cmd_search(
    config: &Config,
    id: &str,
    content_type: Option<&str>,
    limit: u64,
    offset: u64,
) -> anyhow::Result<()> {
    let content_type: Option<ContentType> = content_type.map(str::parse).transpose()?;

    let store = Store::new(&config.general.database_path).await?;
    let records = store
        .search_identities(id, content_type, limit, offset)
        .await?;

    if records.is_empty() {
        println!("No cache rows match '{id}'.");
        return Ok(());
    }

    println!("{} matching rows:", records.len());
    for record in &records {
        super::print_record(record);
    }

    Ok(())
}
