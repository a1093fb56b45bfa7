//! Prometheus metrics collection for the runtime host.
//!
//! - `yunshen_events_dispatched_total{event}` - Events fanned out to handlers
//! - `yunshen_handler_failures_total{event, error}` - Handler errors and panics
//! - `yunshen_commands_total{command}` - Commands executed by canonical name
//! - `yunshen_command_duration_seconds{command}` - Command latency histogram
//! - `yunshen_command_errors_total{command, error}` - Failed commands
//! - `yunshen_reconnect_attempts_total` - Scheduled reconnects
//! - `yunshen_unit_transitions_total{kind, transition, outcome}` - Lifecycle changes
//! - `yunshen_connection_state` - 0 disconnected, 1 connecting, 2 ready, 3 shutting down

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters
// ========================================================================

pub static EVENTS_DISPATCHED: OnceLock<IntCounterVec> = OnceLock::new();

pub static HANDLER_FAILURES: OnceLock<IntCounterVec> = OnceLock::new();

pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

pub static RECONNECT_ATTEMPTS: OnceLock<IntCounter> = OnceLock::new();

pub static UNIT_TRANSITIONS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges
// ========================================================================

pub static CONNECTION_STATE: OnceLock<IntGauge> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Safe to call more than once; only the first call registers anything.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                match $init {
                    Ok(m) => {
                        if let Err(e) = r.register(Box::new(m.clone())) {
                            tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                        }
                        let _ = $metric.set(m);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                    }
                }
            }
        };
    }

    register!(EVENTS_DISPATCHED, IntCounterVec::new(Opts::new("yunshen_events_dispatched_total", "Events dispatched by name"), &["event"]));
    register!(HANDLER_FAILURES, IntCounterVec::new(Opts::new("yunshen_handler_failures_total", "Event handler failures"), &["event", "error"]));
    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("yunshen_commands_total", "Commands executed by name"), &["command"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("yunshen_command_duration_seconds", "Command latency by name")
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("yunshen_command_errors_total", "Command failures"), &["command", "error"]));
    register!(RECONNECT_ATTEMPTS, IntCounter::new("yunshen_reconnect_attempts_total", "Reconnects scheduled"));
    register!(UNIT_TRANSITIONS, IntCounterVec::new(Opts::new("yunshen_unit_transitions_total", "Unit lifecycle transitions"), &["kind", "transition", "outcome"]));
    register!(CONNECTION_STATE, IntGauge::new("yunshen_connection_state", "Supervisor connection state"));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recording helpers (no-ops until `init` has run)
// ============================================================================

#[inline]
pub fn record_event(event: &str) {
    if let Some(c) = EVENTS_DISPATCHED.get() {
        c.with_label_values(&[event]).inc();
    }
}

#[inline]
pub fn record_handler_failure(event: &str, error: &str) {
    if let Some(c) = HANDLER_FAILURES.get() {
        c.with_label_values(&[event, error]).inc();
    }
}

/// Record a command execution with latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    if let Some(c) = COMMAND_COUNTER.get() {
        c.with_label_values(&[command]).inc();
    }
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

/// Record a command error.
#[inline]
pub fn record_command_error(command: &str, error: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[command, error]).inc();
    }
}

#[inline]
pub fn record_reconnect() {
    if let Some(c) = RECONNECT_ATTEMPTS.get() {
        c.inc();
    }
}

#[inline]
pub fn record_transition(kind: &str, transition: &str, ok: bool) {
    if let Some(c) = UNIT_TRANSITIONS.get() {
        let outcome = if ok { "ok" } else { "failed" };
        c.with_label_values(&[kind, transition, outcome]).inc();
    }
}

#[inline]
pub fn set_connection_state(state: i64) {
    if let Some(g) = CONNECTION_STATE.get() {
        g.set(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();
        init();

        record_command("status", 0.001);
        record_event("chat");
        record_transition("plugin", "enable", true);

        let output = gather_metrics();
        assert!(output.contains("yunshen_commands_total"));
        assert!(output.contains("yunshen_events_dispatched_total"));
        assert!(output.contains("yunshen_unit_transitions_total"));
    }
}
