use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{BridgeError, MetaBridge, MetaBridgeIds};
use crate::models::ContentType;

/// Default public relations mirror. These community bridges move around, so
/// the base URL is operator-configurable.
pub const DEFAULT_META_BRIDGE_URL: &str = "https://relations.yuna.moe/api";

#[derive(Debug, Deserialize)]
struct RelationEntry {
    #[serde(alias = "themoviedb")]
    tmdb: Option<i32>,
    #[serde(alias = "thetvdb")]
    tvdb: Option<i32>,
}

/// Community-run meta-bridge keyed by IMDb id. Best-effort by nature: the
/// resolver treats every failure here as "field remains unresolved" and falls
/// back to the first-party endpoints.
#[derive(Clone)]
pub struct MetaBridgeClient {
    client: Client,
    base_url: String,
}

impl MetaBridgeClient {
    #[must_use]
    pub fn new(client: Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MetaBridge for MetaBridgeClient {
    async fn ids_by_imdb(
        &self,
        imdb_id: &str,
        content_type: ContentType,
    ) -> Result<MetaBridgeIds, BridgeError> {
        let url = format!("{}/ids", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("source", "imdb"),
                ("id", imdb_id),
                ("type", content_type.as_str()),
            ])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BridgeError::NotFound);
        }
        if !response.status().is_success() {
            return Err(BridgeError::Status(response.status().as_u16()));
        }

        let entry: RelationEntry = response
            .json()
            .await
            .map_err(|e| BridgeError::Malformed(e.to_string()))?;

        Ok(MetaBridgeIds {
            tmdb_id: entry.tmdb,
            tvdb_id: entry.tvdb,
        })
    }
}
