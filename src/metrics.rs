//! Prometheus metrics collection for canvasd.
//!
//! Tracks session and user counts, frame throughput, broadcast fan-out
//! volume, and error rates. [`serve`] exposes everything registered here
//! on a scrape endpoint.

use axum::{Router, routing::get};
use lazy_static::lazy_static;
use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::net::SocketAddr;

lazy_static! {
    /// Global Prometheus registry for all metrics.
    pub static ref REGISTRY: Registry = Registry::new();

    // ========================================================================
    // Counters (monotonic increasing)
    // ========================================================================

    /// Total frames received from clients.
    pub static ref FRAMES_RECEIVED: IntCounter = IntCounter::new(
        "hub_frames_received_total",
        "Total frames received"
    ).unwrap();

    /// Total frames written to clients.
    pub static ref FRAMES_SENT: IntCounter = IntCounter::new(
        "hub_frames_sent_total",
        "Total frames sent"
    ).unwrap();

    /// Total per-recipient broadcast deliveries.
    pub static ref BROADCAST_DELIVERIES: IntCounter = IntCounter::new(
        "hub_broadcast_deliveries_total",
        "Per-recipient broadcast deliveries"
    ).unwrap();

    /// Total failed authentication attempts.
    pub static ref AUTH_FAILURES: IntCounter = IntCounter::new(
        "hub_auth_failures_total",
        "Failed authentication attempts"
    ).unwrap();

    /// Sessions reaped for missing a heartbeat.
    pub static ref HEARTBEAT_DISCONNECTS: IntCounter = IntCounter::new(
        "hub_heartbeat_disconnects_total",
        "Sessions reaped by the liveness monitor"
    ).unwrap();

    /// Frames received, labeled by frame type.
    pub static ref FRAMES_BY_TYPE: IntCounterVec = IntCounterVec::new(
        Opts::new("hub_frames_by_type_total", "Frames received by type"),
        &["frame"]
    ).unwrap();

    /// Frame handling errors, labeled by frame type and error code.
    pub static ref FRAME_ERRORS: IntCounterVec = IntCounterVec::new(
        Opts::new("hub_frame_errors_total", "Frame handling errors"),
        &["frame", "kind"]
    ).unwrap();

    // ========================================================================
    // Gauges (can increase/decrease)
    // ========================================================================

    /// Currently open sessions, authenticated or not.
    pub static ref CONNECTED_SESSIONS: IntGauge = IntGauge::new(
        "hub_connected_sessions",
        "Currently open sessions"
    ).unwrap();

    /// Currently authenticated users.
    pub static ref ACTIVE_USERS: IntGauge = IntGauge::new(
        "hub_active_users",
        "Currently authenticated users"
    ).unwrap();
}

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at server startup before the endpoint serves.
pub fn init() {
    REGISTRY.register(Box::new(FRAMES_RECEIVED.clone())).unwrap();
    REGISTRY.register(Box::new(FRAMES_SENT.clone())).unwrap();
    REGISTRY
        .register(Box::new(BROADCAST_DELIVERIES.clone()))
        .unwrap();
    REGISTRY.register(Box::new(AUTH_FAILURES.clone())).unwrap();
    REGISTRY
        .register(Box::new(HEARTBEAT_DISCONNECTS.clone()))
        .unwrap();
    REGISTRY.register(Box::new(FRAMES_BY_TYPE.clone())).unwrap();
    REGISTRY.register(Box::new(FRAME_ERRORS.clone())).unwrap();
    REGISTRY
        .register(Box::new(CONNECTED_SESSIONS.clone()))
        .unwrap();
    REGISTRY.register(Box::new(ACTIVE_USERS.clone())).unwrap();
}

/// Count one received frame of the given type.
pub fn record_frame(frame: &str) {
    FRAMES_BY_TYPE.with_label_values(&[frame]).inc();
}

/// Count one frame handling error.
pub fn record_frame_error(frame: &str, kind: &str) {
    FRAME_ERRORS.with_label_values(&[frame, kind]).inc();
}

/// Gather all registered metrics in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if encoder.encode(&families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Serve the scrape endpoint on `0.0.0.0:port` until the process exits.
///
/// Long-running; spawn it in the background. Also exposes `/healthz` so
/// orchestrators can probe the hub without speaking WebSocket.
pub async fn serve(port: u16) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/metrics", get(|| async { gather_metrics() }))
        .route("/healthz", get(|| async { "ok" }));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Metrics endpoint listening");
    axum::serve(listener, app).await?;
    Ok(())
}
