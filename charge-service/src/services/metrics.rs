//! Prometheus metrics for charge-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Charges created, by payment method (low cardinality).
pub static CHARGES_CREATED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "charge_charges_created_total",
        "Total number of charges created",
        &["payment_method"]
    )
    .expect("Failed to register charges_created")
});

/// Status transitions applied, by target status.
pub static STATUS_TRANSITIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "charge_status_transitions_total",
        "Total number of charge status transitions",
        &["to_status"]
    )
    .expect("Failed to register status_transitions")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "charge_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "charge_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&CHARGES_CREATED);
    Lazy::force(&STATUS_TRANSITIONS);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
