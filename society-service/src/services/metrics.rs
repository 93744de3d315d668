//! Metrics collection for society-service.

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

use crate::models::Transition;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Later calls are no-ops.
pub fn init_metrics() {
    METRICS_HANDLE.get_or_init(|| {
        PrometheusBuilder::new()
            .install_recorder()
            .expect("failed to install Prometheus recorder")
    });
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Record a committed onboarding state change.
pub fn record_transition(transition: Transition) {
    counter!("society_transitions_total", "transition" => transition.as_str()).increment(1);
}

/// Record the outcome of a notification send.
pub fn record_notification(template: &'static str, outcome: &'static str) {
    counter!(
        "society_notifications_total",
        "template" => template,
        "outcome" => outcome
    )
    .increment(1);
}
