//! Provider bridge clients.
//!
//! Each external identifier-bearing service is reached through a thin,
//! stateless client behind a trait so the resolver can be exercised against
//! mocks. The [`BridgeRegistry`] is constructed once per set of credentials
//! and passed by dependency injection; there is no process-wide client map.

pub mod meta_bridge;
pub mod tmdb;
pub mod tvdb;
pub mod tvmaze;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ProvidersConfig;
use crate::models::ContentType;

pub use meta_bridge::MetaBridgeClient;
pub use tmdb::TmdbClient;
pub use tvdb::TvdbClient;
pub use tvmaze::TvmazeClient;

/// Failure taxonomy for a single bridge call. The resolver logs these and
/// leaves the field unresolved; none of them abort a walk.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("no match upstream")]
    NotFound,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("upstream returned status {0}")]
    Status(u16),
}

impl BridgeError {
    /// An upstream "no match" is expected traffic, not an incident.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// External ids attached to a film/TV database detail record.
#[derive(Debug, Clone, Default)]
pub struct FilmDbExternalIds {
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<i32>,
}

/// Cross-references carried by an episodic-TV database extended record.
#[derive(Debug, Clone, Default)]
pub struct EpisodicRemoteIds {
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<i32>,
    pub tvmaze_id: Option<i32>,
}

/// Externals block on a TV-schedule service show record.
#[derive(Debug, Clone, Default)]
pub struct ScheduleExternals {
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<i32>,
    pub tvdb_id: Option<i32>,
}

/// Ids returned by the community meta-bridge for one IMDb id.
#[derive(Debug, Clone, Default)]
pub struct MetaBridgeIds {
    pub tmdb_id: Option<i32>,
    pub tvdb_id: Option<i32>,
}

/// Film/TV database (TMDB-shaped) bridge.
#[async_trait]
pub trait FilmDbBridge: Send + Sync {
    /// Detail-record external ids for a known TMDB id.
    async fn external_ids(
        &self,
        tmdb_id: i32,
        content_type: ContentType,
    ) -> Result<FilmDbExternalIds, BridgeError>;

    /// Reverse lookup: TMDB id for a known IMDb id.
    async fn find_by_imdb(
        &self,
        imdb_id: &str,
        content_type: ContentType,
    ) -> Result<Option<i32>, BridgeError>;
}

/// Episodic-TV database (TheTVDB-shaped) bridge.
#[async_trait]
pub trait EpisodicDbBridge: Send + Sync {
    async fn find_by_tmdb(&self, tmdb_id: i32) -> Result<Option<i32>, BridgeError>;

    async fn find_by_imdb(&self, imdb_id: &str) -> Result<Option<i32>, BridgeError>;

    /// Extended record, which carries the remote-id cross-reference list.
    async fn extended(
        &self,
        tvdb_id: i32,
        content_type: ContentType,
    ) -> Result<EpisodicRemoteIds, BridgeError>;
}

/// TV-schedule service (TVmaze-shaped) bridge.
#[async_trait]
pub trait ScheduleBridge: Send + Sync {
    async fn show_externals(&self, tvmaze_id: i32) -> Result<ScheduleExternals, BridgeError>;

    async fn find_by_imdb(&self, imdb_id: &str) -> Result<Option<i32>, BridgeError>;

    async fn find_by_tvdb(&self, tvdb_id: i32) -> Result<Option<i32>, BridgeError>;
}

/// Community meta-bridge keyed by IMDb id.
#[async_trait]
pub trait MetaBridge: Send + Sync {
    async fn ids_by_imdb(
        &self,
        imdb_id: &str,
        content_type: ContentType,
    ) -> Result<MetaBridgeIds, BridgeError>;
}

/// The full set of bridges the resolver walks, built once per credential set.
#[derive(Clone)]
pub struct BridgeRegistry {
    pub film_db: Arc<dyn FilmDbBridge>,
    pub episodic_db: Arc<dyn EpisodicDbBridge>,
    pub schedule: Arc<dyn ScheduleBridge>,
    pub meta_bridge: Arc<dyn MetaBridge>,
}

impl BridgeRegistry {
    /// Builds the live registry from configured credentials. One shared
    /// reqwest client with the configured per-call timeout backs all bridges.
    pub fn from_config(providers: &ProvidersConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(providers.user_agent.clone())
            .timeout(Duration::from_secs(providers.request_timeout_secs))
            .build()?;

        Ok(Self {
            film_db: Arc::new(TmdbClient::new(http.clone(), providers.tmdb_api_key.clone())),
            episodic_db: Arc::new(TvdbClient::new(http.clone(), providers.tvdb_api_key.clone())),
            schedule: Arc::new(TvmazeClient::new(http.clone())),
            meta_bridge: Arc::new(MetaBridgeClient::new(
                http,
                providers.meta_bridge_url.clone(),
            )),
        })
    }

    /// Assembles a registry from pre-built bridges. Used by tests and by
    /// embedders that bring their own client implementations.
    #[must_use]
    pub fn from_parts(
        film_db: Arc<dyn FilmDbBridge>,
        episodic_db: Arc<dyn EpisodicDbBridge>,
        schedule: Arc<dyn ScheduleBridge>,
        meta_bridge: Arc<dyn MetaBridge>,
    ) -> Self {
        Self {
            film_db,
            episodic_db,
            schedule,
            meta_bridge,
        }
    }
}
