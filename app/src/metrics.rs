//! Metrics for the live query and the remote requests.
//!
//! Recorded through the global recorder installed by
//! [`live_todo_runtime::metrics::MetricsRecorder`]; without one, recording
//! is a no-op.

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Register descriptions for the `todo.*` metrics.
pub fn describe() {
    // Subscription Metrics
    describe_counter!(
        "todo.snapshots.received",
        "Snapshots delivered by the remote subscription"
    );
    describe_gauge!("todo.snapshot.items", "Number of items in the latest snapshot");

    // Request Metrics
    describe_counter!("todo.requests.total", "Remote requests issued, by kind");
    describe_counter!("todo.requests.failed", "Remote requests that failed, by kind");
}

/// Subscription metrics recorder.
pub struct SubscriptionMetrics;

impl SubscriptionMetrics {
    /// Record a delivered snapshot.
    pub fn record_snapshot(items: usize) {
        counter!("todo.snapshots.received").increment(1);
        // Item counts stay far below 2^52
        #[allow(clippy::cast_precision_loss)]
        gauge!("todo.snapshot.items").set(items as f64);
    }
}

/// Remote request metrics recorder.
pub struct RequestMetrics;

impl RequestMetrics {
    /// Record a request being issued.
    pub fn record_issued(kind: &'static str) {
        counter!("todo.requests.total", "kind" => kind).increment(1);
    }

    /// Record a failed request.
    pub fn record_failure(kind: &'static str) {
        counter!("todo.requests.failed", "kind" => kind).increment(1);
    }
}
