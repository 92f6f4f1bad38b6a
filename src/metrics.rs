// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the reconciliation controller, exposed over
//! `GET /metrics`.

use prometheus::{CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

const METRICS_NAMESPACE: &str = "reconciler";

/// Global Prometheus registry. All metrics below register themselves here
/// on first access.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Total reconciliations by resource type and outcome (`success`, `failure`).
pub static RECONCILIATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconcile attempts by resource type and outcome",
    );
    let counter = CounterVec::new(opts, &["resource_type", "outcome"]).unwrap();
    METRICS_REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Duration of a reconcile attempt, from permit acquisition to task exit.
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of a reconcile attempt in seconds by resource type",
    )
    .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY.register(Box::new(histogram.clone())).unwrap();
    histogram
});

/// Requeues issued by the requeue scheduler, by resource type.
pub static REQUEUE_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_requeue_total"),
        "Total number of resources requeued by the backoff scheduler",
    );
    let counter = CounterVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Current depth of the priority reconcile queue, as of the last poll.
pub static QUEUE_DEPTH: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_queue_depth"),
        "Number of resources returned by the last priority batch query",
    );
    let gauge = GaugeVec::new(opts, &[]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Admission denials by webhook type (`mutating`, `validating`).
pub static ADMISSION_DENIED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_admission_denied_total"),
        "Total number of writes rejected by the admission chain",
    );
    let counter = CounterVec::new(opts, &["webhook_type"]).unwrap();
    METRICS_REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Events dropped because a subscriber's queue was full.
pub static EVENT_BUS_DROPPED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_event_bus_dropped_total"),
        "Total number of events dropped due to a full subscriber queue",
    );
    let counter = CounterVec::new(opts, &[]).unwrap();
    METRICS_REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Reconcile-semaphore permits currently held.
pub static ACTIVE_PERMITS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_active_permits"),
        "Number of reconcile-semaphore permits currently held",
    );
    let gauge = GaugeVec::new(opts, &[]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

pub fn record_reconciliation_success(resource_type: &str, duration: Duration) {
    RECONCILIATIONS_TOTAL.with_label_values(&[resource_type, "success"]).inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

pub fn record_reconciliation_failure(resource_type: &str, duration: Duration) {
    RECONCILIATIONS_TOTAL.with_label_values(&[resource_type, "failure"]).inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

pub fn record_requeue(resource_type: &str) {
    REQUEUE_TOTAL.with_label_values(&[resource_type]).inc();
}

pub fn set_queue_depth(depth: usize) {
    QUEUE_DEPTH.with_label_values(&[]).set(depth as f64);
}

pub fn record_admission_denied(webhook_type: &str) {
    ADMISSION_DENIED_TOTAL.with_label_values(&[webhook_type]).inc();
}

pub fn record_event_bus_dropped() {
    EVENT_BUS_DROPPED_TOTAL.with_label_values(&[]).inc();
}

pub fn set_active_permits(count: usize) {
    ACTIVE_PERMITS.with_label_values(&[]).set(count as f64);
}

/// Gather and encode every registered metric in Prometheus text exposition
/// format.
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod metrics_tests;
