//! Cross-provider identity types.
//!
//! An [`IdentityRecord`] is the set of known identifiers for one title across
//! the general-purpose providers (TMDB, TheTVDB, IMDb, TVmaze) and the anime
//! id spaces (MyAnimeList, Kitsu, AniDB, AniList). Merging is always
//! fill-if-empty: a populated field is never overwritten by the resolution
//! path, only by explicit correction tooling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content type of a persisted or returned record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    Series,
}

impl ContentType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" => Ok(Self::Movie),
            "series" | "tv" | "show" => Ok(Self::Series),
            other => Err(anyhow::anyhow!("unknown content type: {other}")),
        }
    }
}

/// Request-level media type. `Anime` routes through the static mapping table
/// and is treated as [`ContentType::Series`] unless the caller says movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Series,
    Anime,
}

impl MediaType {
    #[must_use]
    pub const fn content_type(self) -> ContentType {
        match self {
            Self::Movie => ContentType::Movie,
            Self::Series | Self::Anime => ContentType::Series,
        }
    }
}

impl FromStr for MediaType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" => Ok(Self::Movie),
            "series" | "tv" | "show" => Ok(Self::Series),
            "anime" => Ok(Self::Anime),
            other => Err(anyhow::anyhow!("unknown media type: {other}")),
        }
    }
}

/// One identifier namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Tmdb,
    Tvdb,
    Imdb,
    Tvmaze,
    Mal,
    Kitsu,
    Anidb,
    Anilist,
}

impl Provider {
    pub const GENERAL: [Self; 4] = [Self::Tmdb, Self::Tvdb, Self::Imdb, Self::Tvmaze];

    /// Anime namespaces in static-table lookup priority order.
    pub const ANIME: [Self; 4] = [Self::Mal, Self::Kitsu, Self::Anidb, Self::Anilist];

    #[must_use]
    pub const fn is_anime_namespace(self) -> bool {
        matches!(self, Self::Mal | Self::Kitsu | Self::Anidb | Self::Anilist)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tmdb => "tmdb",
            Self::Tvdb => "tvdb",
            Self::Imdb => "imdb",
            Self::Tvmaze => "tvmaze",
            Self::Mal => "mal",
            Self::Kitsu => "kitsu",
            Self::Anidb => "anidb",
            Self::Anilist => "anilist",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tmdb" => Ok(Self::Tmdb),
            "tvdb" | "thetvdb" => Ok(Self::Tvdb),
            "imdb" => Ok(Self::Imdb),
            "tvmaze" => Ok(Self::Tvmaze),
            "mal" | "myanimelist" => Ok(Self::Mal),
            "kitsu" => Ok(Self::Kitsu),
            "anidb" => Ok(Self::Anidb),
            "anilist" => Ok(Self::Anilist),
            other => Err(anyhow::anyhow!("unknown provider: {other}")),
        }
    }
}

/// The set of known cross-provider identifiers for one title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub content_type: ContentType,
    pub tmdb_id: Option<i32>,
    pub tvdb_id: Option<i32>,
    pub imdb_id: Option<String>,
    pub tvmaze_id: Option<i32>,
    pub mal_id: Option<i32>,
    pub kitsu_id: Option<i32>,
    pub anidb_id: Option<i32>,
    pub anilist_id: Option<i32>,
}

impl IdentityRecord {
    #[must_use]
    pub const fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            tmdb_id: None,
            tvdb_id: None,
            imdb_id: None,
            tvmaze_id: None,
            mal_id: None,
            kitsu_id: None,
            anidb_id: None,
            anilist_id: None,
        }
    }

    #[must_use]
    pub fn with_tmdb(mut self, id: i32) -> Self {
        self.tmdb_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_tvdb(mut self, id: i32) -> Self {
        self.tvdb_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_imdb(mut self, id: impl Into<String>) -> Self {
        self.imdb_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_tvmaze(mut self, id: i32) -> Self {
        self.tvmaze_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_mal(mut self, id: i32) -> Self {
        self.mal_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_kitsu(mut self, id: i32) -> Self {
        self.kitsu_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_anidb(mut self, id: i32) -> Self {
        self.anidb_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_anilist(mut self, id: i32) -> Self {
        self.anilist_id = Some(id);
        self
    }

    /// True if the given namespace is populated.
    #[must_use]
    pub fn has(&self, provider: Provider) -> bool {
        match provider {
            Provider::Tmdb => self.tmdb_id.is_some(),
            Provider::Tvdb => self.tvdb_id.is_some(),
            Provider::Imdb => self.imdb_id.is_some(),
            Provider::Tvmaze => self.tvmaze_id.is_some(),
            Provider::Mal => self.mal_id.is_some(),
            Provider::Kitsu => self.kitsu_id.is_some(),
            Provider::Anidb => self.anidb_id.is_some(),
            Provider::Anilist => self.anilist_id.is_some(),
        }
    }

    #[must_use]
    pub fn has_any(&self) -> bool {
        Provider::GENERAL
            .iter()
            .chain(Provider::ANIME.iter())
            .any(|p| self.has(*p))
    }

    #[must_use]
    pub fn has_anime_id(&self) -> bool {
        Provider::ANIME.iter().any(|p| self.has(*p))
    }

    /// Number of populated general-purpose identifier fields. This is the
    /// count the cache's two-field write threshold is measured against.
    #[must_use]
    pub fn general_id_count(&self) -> usize {
        Provider::GENERAL.iter().filter(|p| self.has(**p)).count()
    }

    /// Fill-if-empty merge: copies each field from `other` only where this
    /// record has none. Never touches `content_type`.
    pub fn merge_missing(&mut self, other: &Self) {
        if self.tmdb_id.is_none() {
            self.tmdb_id = other.tmdb_id;
        }
        if self.tvdb_id.is_none() {
            self.tvdb_id = other.tvdb_id;
        }
        if self.imdb_id.is_none() {
            self.imdb_id = other.imdb_id.clone();
        }
        if self.tvmaze_id.is_none() {
            self.tvmaze_id = other.tvmaze_id;
        }
        if self.mal_id.is_none() {
            self.mal_id = other.mal_id;
        }
        if self.kitsu_id.is_none() {
            self.kitsu_id = other.kitsu_id;
        }
        if self.anidb_id.is_none() {
            self.anidb_id = other.anidb_id;
        }
        if self.anilist_id.is_none() {
            self.anilist_id = other.anilist_id;
        }
    }

    /// Whether the record already answers the caller's question.
    ///
    /// With an explicit target list every listed provider must be populated.
    /// Without one, "done" means IMDb plus the provider native to the content
    /// type (TMDB for movies, TheTVDB for series).
    #[must_use]
    pub fn satisfies(&self, targets: Option<&[Provider]>) -> bool {
        match targets {
            Some(list) => list.iter().all(|p| self.has(*p)),
            None => {
                let native = match self.content_type {
                    ContentType::Movie => Provider::Tmdb,
                    ContentType::Series => Provider::Tvdb,
                };
                self.has(Provider::Imdb) && self.has(native)
            }
        }
    }

    /// Providers from `Provider::GENERAL` still missing on this record.
    #[must_use]
    pub fn missing_general(&self) -> Vec<Provider> {
        Provider::GENERAL
            .iter()
            .copied()
            .filter(|p| !self.has(*p))
            .collect()
    }
}
