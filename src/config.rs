use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::clients::meta_bridge::DEFAULT_META_BRIDGE_URL;
use crate::constants;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub providers: ProvidersConfig,

    pub cache: CacheConfig,

    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// 0 lets the runtime pick.
    pub worker_threads: usize,

    /// Optional path to a full anime mapping export. When unset, the
    /// snapshot bundled into the binary is used.
    pub anime_map_path: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/mapparr.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 0,
            anime_map_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub tmdb_api_key: String,

    pub tvdb_api_key: String,

    /// Community relations mirror; these move around.
    pub meta_bridge_url: String,

    pub user_agent: String,

    /// Per-call timeout. There is no overall deadline across a walk.
    pub request_timeout_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            tmdb_api_key: String::new(),
            tvdb_api_key: String::new(),
            meta_bridge_url: DEFAULT_META_BRIDGE_URL.to_string(),
            user_agent: constants::DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_days: i64,

    pub max_size: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_days: constants::DEFAULT_TTL_DAYS,
            max_size: constants::DEFAULT_MAX_CACHE_ROWS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// Six-field cron expression for the maintenance pass. Takes precedence
    /// over the interval when set.
    pub cron_expression: Option<String>,

    pub interval_hours: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron_expression: None,
            interval_hours: constants::DEFAULT_MAINTENANCE_INTERVAL_HOURS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,

    pub buffer_size: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            buffer_size: constants::DEFAULT_TELEMETRY_BUFFER,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            providers: ProvidersConfig::default(),
            cache: CacheConfig::default(),
            scheduler: SchedulerConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::default_config_path();
        self.save_to_path(&path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("mapparr").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".mapparr").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_days <= 0 {
            anyhow::bail!("Cache TTL must be at least one day");
        }

        if self.cache.max_size == 0 {
            anyhow::bail!("Cache size cap must be greater than zero");
        }

        if self.providers.request_timeout_secs == 0 {
            anyhow::bail!("Bridge request timeout must be greater than zero");
        }

        if self.scheduler.enabled
            && self.scheduler.interval_hours == 0
            && self.scheduler.cron_expression.is_none()
        {
            anyhow::bail!("Scheduler interval must be > 0 or cron expression must be set");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [cache]
            ttl_days = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.ttl_days, 7);
        assert_eq!(config.cache.max_size, constants::DEFAULT_MAX_CACHE_ROWS);
        assert!(config.scheduler.enabled);
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let mut config = Config::default();
        config.cache.ttl_days = 0;
        assert!(config.validate().is_err());
    }
}
