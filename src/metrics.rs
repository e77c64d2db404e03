// src/metrics.rs

#[cfg(feature = "observability")]
pub use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

// NOTE: When observability feature is disabled, provide stub implementations
#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! counter {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! gauge {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! histogram {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_counter {
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_gauge {
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_histogram {
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
use crate::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

use std::time::Duration;

/// Initializes the descriptions for all the metrics in the application.
/// This should be called once at startup.
pub fn describe_metrics() {
    describe_counter!(
        "adapter_calls_total",
        "Validator adapter calls by network and outcome (ok, or the error kind)."
    );
    describe_histogram!(
        "adapter_call_duration_ms",
        "Wall time of a single validator adapter call, timeout included."
    );
    describe_histogram!(
        "aggregation_duration_ms",
        "Wall time of a full aggregation cycle (fan-out, prices and merge)."
    );
    describe_counter!("aggregation_cycles_total", "Completed aggregation cycles.");
    describe_gauge!(
        "aggregation_errors",
        "Number of networks that failed in the most recent cycle."
    );
    describe_gauge!(
        "total_stake_usd",
        "Total USD value of stake across active networks with a known price."
    );
    describe_counter!(
        "price_fetch_failures_total",
        "Price oracle failures by error kind; prices are dropped for that cycle."
    );
    describe_counter!("aggregation_cache_hits_total", "Aggregation results served from cache.");
    describe_counter!("aggregation_cache_miss_total", "Aggregation cache misses (refresh required).");
}

pub fn record_adapter_call(network: &str, outcome: &str, duration: Duration) {
    counter!("adapter_calls_total", 1, "network" => network.to_string(), "outcome" => outcome.to_string());
    histogram!("adapter_call_duration_ms", duration.as_millis() as f64,
               "network" => network.to_string());
}

pub fn record_aggregation(duration: Duration, error_count: usize) {
    counter!("aggregation_cycles_total", 1);
    histogram!("aggregation_duration_ms", duration.as_millis() as f64);
    gauge!("aggregation_errors", error_count as f64);
}

pub fn set_total_stake_usd(value: f64) {
    gauge!("total_stake_usd", value);
}

pub fn increment_price_failure(kind: &str) {
    counter!("price_fetch_failures_total", 1, "kind" => kind.to_string());
}

pub fn increment_cache_hit() {
    counter!("aggregation_cache_hits_total", 1);
}

pub fn increment_cache_miss() {
    counter!("aggregation_cache_miss_total", 1);
}
