//! Operator-tunable defaults.

/// Rows older than this many days are expired from the equivalence cache.
pub const DEFAULT_TTL_DAYS: i64 = 90;

/// Row cap for the equivalence cache; oldest rows are evicted past this.
pub const DEFAULT_MAX_CACHE_ROWS: u64 = 100_000;

/// Per-call timeout for every provider bridge request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Bounded telemetry channel depth.
pub const DEFAULT_TELEMETRY_BUFFER: usize = 1024;

/// Fallback maintenance cadence when no cron expression is configured.
pub const DEFAULT_MAINTENANCE_INTERVAL_HOURS: u64 = 12;

pub const DEFAULT_USER_AGENT: &str = "mapparr/0.1";
