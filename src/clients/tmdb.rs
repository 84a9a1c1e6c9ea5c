use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{BridgeError, FilmDbBridge, FilmDbExternalIds};
use crate::models::ContentType;

const TMDB_API: &str = "https://api.themoviedb.org/3";

#[derive(Debug, Deserialize)]
struct ExternalIdsResponse {
    imdb_id: Option<String>,
    tvdb_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    movie_results: Vec<FindResult>,
    #[serde(default)]
    tv_results: Vec<FindResult>,
}

#[derive(Debug, Deserialize)]
struct FindResult {
    id: i32,
}

/// TMDB v3 client. Movie detail records expose only an IMDb cross-reference;
/// TV records additionally carry a TheTVDB id.
#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
}

impl TmdbClient {
    #[must_use]
    pub const fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }

    const fn path_segment(content_type: ContentType) -> &'static str {
        match content_type {
            ContentType::Movie => "movie",
            ContentType::Series => "tv",
        }
    }
}

#[async_trait]
impl FilmDbBridge for TmdbClient {
    async fn external_ids(
        &self,
        tmdb_id: i32,
        content_type: ContentType,
    ) -> Result<FilmDbExternalIds, BridgeError> {
        let url = format!(
            "{}/{}/{}/external_ids",
            TMDB_API,
            Self::path_segment(content_type),
            tmdb_id
        );
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BridgeError::NotFound);
        }
        if !response.status().is_success() {
            return Err(BridgeError::Status(response.status().as_u16()));
        }

        let ids: ExternalIdsResponse = response
            .json()
            .await
            .map_err(|e| BridgeError::Malformed(e.to_string()))?;

        Ok(FilmDbExternalIds {
            // TMDB reports missing IMDb links as empty strings on some titles
            imdb_id: ids.imdb_id.filter(|s| !s.is_empty()),
            tvdb_id: ids.tvdb_id.filter(|id| *id > 0),
        })
    }

    async fn find_by_imdb(
        &self,
        imdb_id: &str,
        content_type: ContentType,
    ) -> Result<Option<i32>, BridgeError> {
        let url = format!("{TMDB_API}/find/{imdb_id}");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("external_source", "imdb_id"),
            ])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(BridgeError::Status(response.status().as_u16()));
        }

        let found: FindResponse = response
            .json()
            .await
            .map_err(|e| BridgeError::Malformed(e.to_string()))?;

        let results = match content_type {
            ContentType::Movie => found.movie_results,
            ContentType::Series => found.tv_results,
        };

        Ok(results.into_iter().next().map(|r| r.id))
    }
}
