use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use super::{BridgeError, EpisodicDbBridge, EpisodicRemoteIds};
use crate::models::ContentType;

const TVDB_API: &str = "https://api4.thetvdb.com/v4";

// sourceName values on TheTVDB remote-id cross-references.
const SOURCE_IMDB: &str = "IMDB";
const SOURCE_TMDB: &str = "TheMovieDB.com";
const SOURCE_TVMAZE: &str = "TV Maze";

#[derive(Debug, Deserialize)]
struct TvdbResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

#[derive(Debug, Deserialize)]
struct SearchRemoteIdResult {
    series: Option<TvdbIdHolder>,
    movie: Option<TvdbIdHolder>,
}

#[derive(Debug, Deserialize)]
struct TvdbIdHolder {
    id: i32,
}

#[derive(Debug, Deserialize)]
struct ExtendedRecord {
    #[serde(rename = "remoteIds", default)]
    remote_ids: Vec<RemoteId>,
}

#[derive(Debug, Deserialize)]
struct RemoteId {
    id: String,
    #[serde(rename = "sourceName")]
    source_name: String,
}

/// TheTVDB v4 client. The API is bearer-token authenticated; the token is
/// fetched lazily on first use and refreshed once when a call comes back 401.
pub struct TvdbClient {
    client: Client,
    api_key: String,
    token: RwLock<Option<String>>,
}

impl TvdbClient {
    #[must_use]
    pub const fn new(client: Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            token: RwLock::const_new(None),
        }
    }

    async fn login(&self) -> Result<String, BridgeError> {
        debug!("Authenticating with TheTVDB");
        let response = self
            .client
            .post(format!("{TVDB_API}/login"))
            .json(&serde_json::json!({ "apikey": self.api_key }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BridgeError::Status(response.status().as_u16()));
        }

        let login: TvdbResponse<LoginData> = response
            .json()
            .await
            .map_err(|e| BridgeError::Malformed(e.to_string()))?;

        let mut guard = self.token.write().await;
        *guard = Some(login.data.token.clone());
        Ok(login.data.token)
    }

    async fn token(&self) -> Result<String, BridgeError> {
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }
        self.login().await
    }

    /// Issues an authenticated GET, retrying once after a fresh login if the
    /// token has expired.
    async fn get_authed(&self, url: &str) -> Result<reqwest::Response, BridgeError> {
        let token = self.token().await?;
        let response = self.client.get(url).bearer_auth(&token).send().await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            debug!(reason = "token_expired", "Re-authenticating with TheTVDB");
            let token = self.login().await?;
            return Ok(self.client.get(url).bearer_auth(&token).send().await?);
        }

        Ok(response)
    }

    async fn find_by_remote_id(&self, remote_id: &str) -> Result<Option<i32>, BridgeError> {
        let url = format!("{TVDB_API}/search/remoteid/{remote_id}");
        let response = self.get_authed(&url).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(BridgeError::Status(response.status().as_u16()));
        }

        let results: TvdbResponse<Vec<SearchRemoteIdResult>> = response
            .json()
            .await
            .map_err(|e| BridgeError::Malformed(e.to_string()))?;

        Ok(results
            .data
            .into_iter()
            .find_map(|r| r.series.or(r.movie).map(|h| h.id)))
    }
}

#[async_trait]
impl EpisodicDbBridge for TvdbClient {
    async fn find_by_tmdb(&self, tmdb_id: i32) -> Result<Option<i32>, BridgeError> {
        self.find_by_remote_id(&tmdb_id.to_string()).await
    }

    async fn find_by_imdb(&self, imdb_id: &str) -> Result<Option<i32>, BridgeError> {
        self.find_by_remote_id(imdb_id).await
    }

    async fn extended(
        &self,
        tvdb_id: i32,
        content_type: ContentType,
    ) -> Result<EpisodicRemoteIds, BridgeError> {
        let segment = match content_type {
            ContentType::Movie => "movies",
            ContentType::Series => "series",
        };
        let url = format!("{TVDB_API}/{segment}/{tvdb_id}/extended");
        let response = self.get_authed(&url).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BridgeError::NotFound);
        }
        if !response.status().is_success() {
            return Err(BridgeError::Status(response.status().as_u16()));
        }

        let record: TvdbResponse<ExtendedRecord> = response
            .json()
            .await
            .map_err(|e| BridgeError::Malformed(e.to_string()))?;

        let mut ids = EpisodicRemoteIds::default();
        for remote in record.data.remote_ids {
            match remote.source_name.as_str() {
                SOURCE_IMDB => {
                    if ids.imdb_id.is_none() && remote.id.starts_with("tt") {
                        ids.imdb_id = Some(remote.id);
                    }
                }
                SOURCE_TMDB => {
                    if ids.tmdb_id.is_none() {
                        ids.tmdb_id = remote.id.parse().ok();
                    }
                }
                SOURCE_TVMAZE => {
                    if ids.tvmaze_id.is_none() {
                        ids.tvmaze_id = remote.id.parse().ok();
                    }
                }
                _ => {}
            }
        }

        Ok(ids)
    }
}
