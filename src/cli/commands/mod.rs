mod add_mapping;
mod clear;
mod init;
mod optimize;
mod resolve;
mod search;
mod stats;

pub use add_mapping::cmd_add_mapping;
pub use clear::cmd_clear;
pub use init::cmd_init;
pub use optimize::cmd_optimize;
pub use resolve::cmd_resolve;
pub use search::cmd_search;
pub use stats::cmd_stats;

use crate::models::IdentityRecord;

/// Shared pretty-printer for identity records.
pub(crate) fn print_record(record: &IdentityRecord) {
    println!("{:-<50}", "");
    println!("Type:    {}", record.content_type);
    print_field("TMDB", record.tmdb_id.map(|v| v.to_string()));
    print_field("TheTVDB", record.tvdb_id.map(|v| v.to_string()));
    print_field("IMDb", record.imdb_id.clone());
    print_field("TVmaze", record.tvmaze_id.map(|v| v.to_string()));
    print_field("MAL", record.mal_id.map(|v| v.to_string()));
    print_field("Kitsu", record.kitsu_id.map(|v| v.to_string()));
    print_field("AniDB", record.anidb_id.map(|v| v.to_string()));
    print_field("AniList", record.anilist_id.map(|v| v.to_string()));
}

fn print_field(label: &str, value: Option<String>) {
    if let Some(v) = value {
        println!("{label}:{}{}", " ".repeat(9_usize.saturating_sub(label.len())), v);
    }
}
