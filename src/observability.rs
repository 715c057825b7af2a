use std::net::SocketAddr;

// ── Mutation metrics ────────────────────────────────────────────

/// Counter: mutations attempted. Labels: op, status.
pub const MUTATIONS_TOTAL: &str = "modelweek_mutations_total";

/// Counter: rejected mutations. Labels: op, reason.
pub const REJECTIONS_TOTAL: &str = "modelweek_rejections_total";

/// Counter: drafts closed without saving.
pub const DRAFTS_ABANDONED_TOTAL: &str = "modelweek_drafts_abandoned_total";

// ── Persistence metrics ─────────────────────────────────────────

/// Histogram: store save duration in seconds.
pub const SAVE_DURATION_SECONDS: &str = "modelweek_save_duration_seconds";

/// Counter: failed saves.
pub const SAVE_FAILURES_TOTAL: &str = "modelweek_save_failures_total";

/// Counter: snapshots skipped because a newer one was queued behind them.
pub const SAVES_COALESCED_TOTAL: &str = "modelweek_saves_coalesced_total";

/// Gauge: open planning sessions.
pub const SESSIONS_ACTIVE: &str = "modelweek_sessions_active";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
