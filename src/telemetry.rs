//! Resolution telemetry.
//!
//! Events are handed off through a bounded channel with `try_send` so the
//! resolver never blocks on (or fails because of) a metrics sink. A full
//! buffer drops the event and counts the drop.

use tokio::sync::mpsc;
use tracing::debug;

/// What happened during a resolution, as far as counters care. Bridge events
/// carry the upstream service tag ("tmdb", "tvdb", "tvmaze", "meta-bridge").
#[derive(Debug, Clone, Copy)]
pub enum ResolverEvent {
    CacheHit,
    CacheMiss,
    StaticTableHit,
    BridgeCall(&'static str),
    BridgeFailure(&'static str),
    RecordPersisted,
}

/// Cloneable emitter handed to resolvers. `None` inside means telemetry is
/// disabled and emits are no-ops.
#[derive(Clone)]
pub struct Telemetry {
    tx: Option<mpsc::Sender<ResolverEvent>>,
}

impl Telemetry {
    /// Creates the channel and spawns the drain task. Returns the emitter.
    #[must_use]
    pub fn spawn(buffer: usize) -> Self {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        tokio::spawn(drain(rx));
        Self { tx: Some(tx) }
    }

    /// An emitter that discards everything.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { tx: None }
    }

    /// Non-blocking emit. Resolution latency never depends on the sink.
    pub fn emit(&self, event: ResolverEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.try_send(event).is_err() {
            metrics::counter!("mapparr_telemetry_dropped_total").increment(1);
        }
    }
}

async fn drain(mut rx: mpsc::Receiver<ResolverEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            ResolverEvent::CacheHit => {
                metrics::counter!("mapparr_cache_hits_total").increment(1);
            }
            ResolverEvent::CacheMiss => {
                metrics::counter!("mapparr_cache_misses_total").increment(1);
            }
            ResolverEvent::StaticTableHit => {
                metrics::counter!("mapparr_static_table_hits_total").increment(1);
            }
            ResolverEvent::BridgeCall(service) => {
                metrics::counter!("mapparr_bridge_calls_total", "service" => service).increment(1);
            }
            ResolverEvent::BridgeFailure(service) => {
                metrics::counter!("mapparr_bridge_failures_total", "service" => service)
                    .increment(1);
            }
            ResolverEvent::RecordPersisted => {
                metrics::counter!("mapparr_records_persisted_total").increment(1);
            }
        }
    }
    debug!("Telemetry drain task finished");
}
