use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{BridgeError, ScheduleBridge, ScheduleExternals};

const TVMAZE_API: &str = "https://api.tvmaze.com";

#[derive(Debug, Deserialize)]
struct Show {
    id: i32,
    #[serde(default)]
    externals: Externals,
}

#[derive(Debug, Default, Deserialize)]
struct Externals {
    imdb: Option<String>,
    thetvdb: Option<i32>,
    themoviedb: Option<i32>,
}

/// TVmaze client. No credentials; the public API covers shows only, so every
/// lookup here is series-scoped by construction.
#[derive(Clone)]
pub struct TvmazeClient {
    client: Client,
}

impl TvmazeClient {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_show(&self, url: &str, query: &[(&str, &str)]) -> Result<Option<Show>, BridgeError> {
        let response = self.client.get(url).query(query).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(BridgeError::Status(response.status().as_u16()));
        }

        let show: Show = response
            .json()
            .await
            .map_err(|e| BridgeError::Malformed(e.to_string()))?;
        Ok(Some(show))
    }
}

#[async_trait]
impl ScheduleBridge for TvmazeClient {
    async fn show_externals(&self, tvmaze_id: i32) -> Result<ScheduleExternals, BridgeError> {
        let url = format!("{TVMAZE_API}/shows/{tvmaze_id}");
        let show = self
            .fetch_show(&url, &[])
            .await?
            .ok_or(BridgeError::NotFound)?;

        Ok(ScheduleExternals {
            imdb_id: show.externals.imdb.filter(|s| !s.is_empty()),
            tvdb_id: show.externals.thetvdb,
            tmdb_id: show.externals.themoviedb,
        })
    }

    async fn find_by_imdb(&self, imdb_id: &str) -> Result<Option<i32>, BridgeError> {
        let url = format!("{TVMAZE_API}/lookup/shows");
        let show = self.fetch_show(&url, &[("imdb", imdb_id)]).await?;
        Ok(show.map(|s| s.id))
    }

    async fn find_by_tvdb(&self, tvdb_id: i32) -> Result<Option<i32>, BridgeError> {
        let url = format!("{TVMAZE_API}/lookup/shows");
        let tvdb_id = tvdb_id.to_string();
        let show = self.fetch_show(&url, &[("thetvdb", tvdb_id.as_str())]).await?;
        Ok(show.map(|s| s.id))
    }
}
