// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the botanist.
//!
//! All metrics carry the namespace prefix `gardener_botanist_`.
//!
//! # Metrics Categories
//!
//! - **Phase Metrics** - Duration and outcome of each reconciliation phase
//! - **Secret Metrics** - Secrets deployed into the seed and stale secrets removed
//! - **Managed Resource Metrics** - Bundles reconciled
//!
//! # Example
//!
//! ```rust,no_run
//! use botanist::metrics::record_phase_success;
//!
//! record_phase_success("deploy", std::time::Duration::from_secs(1));
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

/// Namespace prefix for all botanist metrics
const METRICS_NAMESPACE: &str = "gardener_botanist";

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Phase Metrics
// ============================================================================

/// Total number of phase runs by phase and status
///
/// Labels:
/// - `phase`: Phase name (e.g., `generate`, `deploy`)
/// - `status`: Outcome (`success`, `error`)
pub static PHASES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_phases_total"),
        "Total number of phase runs by phase and status",
    );
    let counter = CounterVec::new(opts, &["phase", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of phases in seconds
pub static PHASE_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_phase_duration_seconds"),
        "Duration of reconciliation phases in seconds",
    )
    .buckets(vec![0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]);
    let histogram = HistogramVec::new(opts, &["phase"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Secret Metrics
// ============================================================================

/// Total number of secrets written into seed namespaces
///
/// Labels:
/// - `namespace`: Seed namespace of the shoot
pub static SECRETS_DEPLOYED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_secrets_deployed_total"),
        "Total number of secrets deployed by namespace",
    );
    let counter = CounterVec::new(opts, &["namespace"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of stale secrets garbage-collected
pub static STALE_SECRETS_DELETED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_stale_secrets_deleted_total"),
        "Total number of stale secrets deleted by namespace",
    );
    let counter = CounterVec::new(opts, &["namespace"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Managed Resource Metrics
// ============================================================================

/// Total number of managed resources reconciled
///
/// Labels:
/// - `managed_resource`: Bundle name (e.g., `shoot-core`)
pub static MANAGED_RESOURCES_RECONCILED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_managed_resources_reconciled_total"),
        "Total number of managed resources reconciled by name",
    );
    let counter = CounterVec::new(opts, &["managed_resource"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful phase
///
/// # Arguments
/// * `phase` - Phase name
/// * `duration` - Time taken by the phase
pub fn record_phase_success(phase: &str, duration: Duration) {
    PHASES_TOTAL.with_label_values(&[phase, "success"]).inc();
    PHASE_DURATION_SECONDS
        .with_label_values(&[phase])
        .observe(duration.as_secs_f64());
}

/// Record a failed phase
///
/// # Arguments
/// * `phase` - Phase name
/// * `duration` - Time taken before the failure
pub fn record_phase_error(phase: &str, duration: Duration) {
    PHASES_TOTAL.with_label_values(&[phase, "error"]).inc();
    PHASE_DURATION_SECONDS
        .with_label_values(&[phase])
        .observe(duration.as_secs_f64());
}

pub fn record_secrets_deployed(namespace: &str, count: usize) {
    SECRETS_DEPLOYED_TOTAL
        .with_label_values(&[namespace])
        .inc_by(count as f64);
}

pub fn record_stale_secrets_deleted(namespace: &str, count: usize) {
    STALE_SECRETS_DELETED_TOTAL
        .with_label_values(&[namespace])
        .inc_by(count as f64);
}

pub fn record_managed_resource_reconciled(name: &str) {
    MANAGED_RESOURCES_RECONCILED_TOTAL
        .with_label_values(&[name])
        .inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
