//! Static anime mapping table.
//!
//! A read-only, in-memory index correlating the anime id spaces (MAL, Kitsu,
//! AniDB, AniList) with the general-purpose providers. The dataset ships
//! embedded in the binary; operators can point `general.anime_map_path` at a
//! fuller export instead. Rows are validated once at load time; lookups
//! trust the shape and never touch the network or the equivalence cache.
//!
//! There is no reload hook: picking up a new dataset requires a restart.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rust_embed::RustEmbed;
use serde::Deserialize;
use tracing::{info, warn};

use crate::models::{ContentType, IdentityRecord, Provider};

#[derive(RustEmbed)]
#[folder = "data/"]
struct BundledData;

const BUNDLED_DATASET: &str = "anime-id-map.json";

/// One validated dataset row. Fixed shape, checked at load; at least one
/// anime-space id must be present or the row is dropped.
#[derive(Debug, Clone, Deserialize)]
pub struct MappingEntry {
    pub mal_id: Option<i32>,
    pub kitsu_id: Option<i32>,
    pub anidb_id: Option<i32>,
    pub anilist_id: Option<i32>,
    pub tvdb_id: Option<i32>,
    pub tmdb_id: Option<i32>,
    pub imdb_id: Option<String>,
    pub tvmaze_id: Option<i32>,
    #[serde(rename = "type", default)]
    pub content_type: Option<ContentType>,
}

impl MappingEntry {
    fn has_anime_id(&self) -> bool {
        self.mal_id.is_some()
            || self.kitsu_id.is_some()
            || self.anidb_id.is_some()
            || self.anilist_id.is_some()
    }

    fn to_record(&self) -> IdentityRecord {
        IdentityRecord {
            content_type: self.content_type.unwrap_or(ContentType::Series),
            tmdb_id: self.tmdb_id,
            tvdb_id: self.tvdb_id,
            imdb_id: self.imdb_id.clone(),
            tvmaze_id: self.tvmaze_id,
            mal_id: self.mal_id,
            kitsu_id: self.kitsu_id,
            anidb_id: self.anidb_id,
            anilist_id: self.anilist_id,
        }
    }
}

/// The loaded table: entries plus one O(1) index per anime namespace. A
/// single entry is reachable from any of its anime ids.
pub struct AnimeMapTable {
    entries: Vec<MappingEntry>,
    by_mal: HashMap<i32, usize>,
    by_kitsu: HashMap<i32, usize>,
    by_anidb: HashMap<i32, usize>,
    by_anilist: HashMap<i32, usize>,
}

impl AnimeMapTable {
    /// Loads the snapshot bundled into the binary.
    pub fn load_bundled() -> Result<Self> {
        let file = BundledData::get(BUNDLED_DATASET)
            .context("Bundled anime mapping dataset is missing from the binary")?;
        Self::from_json_bytes(&file.data)
    }

    /// Loads an operator-supplied dataset file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read anime mapping file: {}", path.display()))?;
        Self::from_json_bytes(&bytes)
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: Vec<MappingEntry> =
            serde_json::from_slice(bytes).context("Failed to parse anime mapping dataset")?;

        let total = raw.len();
        let mut entries = Vec::with_capacity(total);
        let mut by_mal = HashMap::new();
        let mut by_kitsu = HashMap::new();
        let mut by_anidb = HashMap::new();
        let mut by_anilist = HashMap::new();
        let mut dropped = 0usize;

        for entry in raw {
            if !entry.has_anime_id() {
                dropped += 1;
                continue;
            }

            let idx = entries.len();
            if let Some(id) = entry.mal_id {
                by_mal.entry(id).or_insert(idx);
            }
            if let Some(id) = entry.kitsu_id {
                by_kitsu.entry(id).or_insert(idx);
            }
            if let Some(id) = entry.anidb_id {
                by_anidb.entry(id).or_insert(idx);
            }
            if let Some(id) = entry.anilist_id {
                by_anilist.entry(id).or_insert(idx);
            }
            entries.push(entry);
        }

        if dropped > 0 {
            warn!(
                dropped,
                total, "Anime mapping rows without any anime-space id were dropped"
            );
        }
        info!(entries = entries.len(), "Anime mapping table loaded");

        Ok(Self {
            entries,
            by_mal,
            by_kitsu,
            by_anidb,
            by_anilist,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn by_mal(&self, id: i32) -> Option<IdentityRecord> {
        self.by_mal.get(&id).map(|i| self.entries[*i].to_record())
    }

    #[must_use]
    pub fn by_kitsu(&self, id: i32) -> Option<IdentityRecord> {
        self.by_kitsu.get(&id).map(|i| self.entries[*i].to_record())
    }

    #[must_use]
    pub fn by_anidb(&self, id: i32) -> Option<IdentityRecord> {
        self.by_anidb.get(&id).map(|i| self.entries[*i].to_record())
    }

    #[must_use]
    pub fn by_anilist(&self, id: i32) -> Option<IdentityRecord> {
        self.by_anilist
            .get(&id)
            .map(|i| self.entries[*i].to_record())
    }

    /// Lookup through whichever anime id `seeds` carries, in priority order
    /// mal → kitsu → anidb → anilist.
    #[must_use]
    pub fn lookup(&self, seeds: &IdentityRecord) -> Option<IdentityRecord> {
        for provider in Provider::ANIME {
            let found = match provider {
                Provider::Mal => seeds.mal_id.and_then(|id| self.by_mal(id)),
                Provider::Kitsu => seeds.kitsu_id.and_then(|id| self.by_kitsu(id)),
                Provider::Anidb => seeds.anidb_id.and_then(|id| self.by_anidb(id)),
                Provider::Anilist => seeds.anilist_id.and_then(|id| self.by_anilist(id)),
                _ => None,
            };
            if found.is_some() {
                return found;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"mal_id": 1, "kitsu_id": 1, "anidb_id": 23, "anilist_id": 1,
         "tvdb_id": 76885, "tmdb_id": 30991, "imdb_id": "tt0213338", "type": "series"},
        {"mal_id": 199, "anidb_id": 512, "tmdb_id": 129, "imdb_id": "tt0245429", "type": "movie"},
        {"tvdb_id": 999, "type": "series"}
    ]"#;

    #[test]
    fn load_drops_rows_without_anime_ids() {
        let table = AnimeMapTable::from_json_bytes(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn any_anime_id_resolves_the_same_entry() {
        let table = AnimeMapTable::from_json_bytes(SAMPLE.as_bytes()).unwrap();

        let by_mal = table.by_mal(1).unwrap();
        let by_kitsu = table.by_kitsu(1).unwrap();
        let by_anidb = table.by_anidb(23).unwrap();
        let by_anilist = table.by_anilist(1).unwrap();

        assert_eq!(by_mal, by_kitsu);
        assert_eq!(by_mal, by_anidb);
        assert_eq!(by_mal, by_anilist);
        assert_eq!(by_mal.tvdb_id, Some(76885));
        assert_eq!(by_mal.imdb_id.as_deref(), Some("tt0213338"));
    }

    #[test]
    fn lookup_prefers_mal_over_later_namespaces() {
        let table = AnimeMapTable::from_json_bytes(SAMPLE.as_bytes()).unwrap();

        // anidb 512 points at the movie row, mal 1 at the series row.
        let seeds = IdentityRecord::new(ContentType::Series)
            .with_mal(1)
            .with_anidb(512);
        let found = table.lookup(&seeds).unwrap();
        assert_eq!(found.tvdb_id, Some(76885));
    }

    #[test]
    fn bundled_snapshot_parses() {
        let table = AnimeMapTable::load_bundled().unwrap();
        assert!(!table.is_empty());
        // Scenario anchor: MAL 1 is fully cross-referenced in the snapshot.
        let rec = table.by_mal(1).unwrap();
        assert!(rec.tvdb_id.is_some());
        assert!(rec.imdb_id.is_some());
    }

    #[test]
    fn malformed_dataset_is_an_error() {
        assert!(AnimeMapTable::from_json_bytes(b"{not json").is_err());
    }
}
