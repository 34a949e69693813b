//! Prometheus metrics for the relay
//!
//! This module provides metrics tracking for:
//! - Poll loop: cycles, skipped ticks, fetched and delivered articles
//! - Failures: delivery failures, ledger write failures
//! - Translation gate: outcomes and time spent waiting on the throttle
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter, register_counter_vec, register_histogram, Counter, CounterVec, Encoder,
    Histogram, TextEncoder,
};
use std::sync::OnceLock;
use std::time::Duration;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all relay metrics
struct RelayMetrics {
    cycles: Counter,
    ticks_skipped: Counter,
    articles_fetched: Counter,
    articles_delivered: Counter,
    delivery_failures: Counter,
    ledger_write_failures: Counter,
    translations: CounterVec,
    throttle_wait: Histogram,
}

/// Global storage for relay metrics
static RELAY_METRICS: OnceLock<RelayMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// If metric registration fails, the error is returned and subsequent
/// metric operations become no-ops.
///
/// # Example
///
/// ```no_run
/// if let Err(e) = steamcast::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {e}");
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let relay = RelayMetrics {
        cycles: register_counter!("steamcast_cycles_total", "Poll cycles run")?,
        ticks_skipped: register_counter!(
            "steamcast_ticks_skipped_total",
            "Ticks dropped because a cycle was still running"
        )?,
        articles_fetched: register_counter!(
            "steamcast_articles_fetched_total",
            "Articles returned by the feed"
        )?,
        articles_delivered: register_counter!(
            "steamcast_articles_delivered_total",
            "Articles delivered to the sink"
        )?,
        delivery_failures: register_counter!(
            "steamcast_delivery_failures_total",
            "Articles whose structured and plain deliveries both failed"
        )?,
        ledger_write_failures: register_counter!(
            "steamcast_ledger_write_failures_total",
            "Ledger flushes that failed"
        )?,
        translations: register_counter_vec!(
            "steamcast_translations_total",
            "Translation calls by outcome",
            &["outcome"]
        )?,
        throttle_wait: register_histogram!(
            "steamcast_throttle_wait_seconds",
            "Time spent waiting on the translation throttle",
            vec![0.0, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]
        )?,
    };

    RELAY_METRICS
        .set(relay)
        .map_err(|_| "Relay metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    RELAY_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record a completed poll cycle
pub fn record_cycle(fetched: usize, delivered: usize, failed: usize, ledger_errors: usize) {
    let Some(m) = RELAY_METRICS.get() else {
        return;
    };

    m.cycles.inc();
    m.articles_fetched.inc_by(fetched as f64);
    m.articles_delivered.inc_by(delivered as f64);
    m.delivery_failures.inc_by(failed as f64);
    m.ledger_write_failures.inc_by(ledger_errors as f64);
}

/// Record a tick dropped while busy
pub fn record_tick_skipped() {
    if let Some(m) = RELAY_METRICS.get() {
        m.ticks_skipped.inc();
    }
}

/// Record one translation call outcome (`ok` or `failed`)
pub fn record_translation(outcome: &str) {
    if let Some(m) = RELAY_METRICS.get() {
        m.translations.with_label_values(&[outcome]).inc();
    }
}

/// Record the time a caller waited on the throttle
pub fn record_throttle_wait(waited: Duration) {
    if let Some(m) = RELAY_METRICS.get() {
        m.throttle_wait.observe(waited.as_secs_f64());
    }
}

// ============================================================================
// Tests
// ============================================================================
