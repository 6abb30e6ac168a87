use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: HTTP requests handled. Labels: endpoint, status.
pub const REQUESTS_TOTAL: &str = "roombook_requests_total";

/// Histogram: request latency in seconds. Labels: endpoint.
pub const REQUEST_DURATION_SECONDS: &str = "roombook_request_duration_seconds";

/// Counter: bookings refused because the slot was missing or taken.
pub const BOOKING_CONFLICTS_TOTAL: &str = "roombook_booking_conflicts_total";

/// Counter: bookings that saw a free slot but lost the conditional update.
pub const BOOKING_RACES_LOST_TOTAL: &str = "roombook_booking_races_lost_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Counter: slot rows added by seeding.
pub const SLOTS_SEEDED_TOTAL: &str = "roombook_slots_seeded_total";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "roombook_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "roombook_wal_flush_batch_size";

/// Install the fmt subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}

/// Install the Prometheus exporter on `port`. No-op if `port` is `None`.
pub fn init_metrics(
    port: Option<u16>,
) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
