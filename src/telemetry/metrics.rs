//! Metric instrument factories for scorebot-rs.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"scorebot-rs"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for scorebot-rs instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("scorebot-rs")
}

/// Counter: submissions handled by an ingestion cycle.
/// Labels: `result` ("queued" | "duplicate" | "error").
pub fn submissions_ingested() -> Counter<u64> {
    meter()
        .u64_counter("scorebot.submissions.ingested")
        .with_description("Number of submissions handled by ingestion")
        .build()
}

/// Counter: per-item drain outcomes.
/// Labels: `outcome` (terminal state machine outcomes plus "retry").
pub fn drain_outcomes() -> Counter<u64> {
    meter()
        .u64_counter("scorebot.drain.outcomes")
        .with_description("Number of work items processed, by outcome")
        .build()
}

/// Counter: transient scoring failures (non-200 or transport).
pub fn scoring_failures() -> Counter<u64> {
    meter()
        .u64_counter("scorebot.scoring.failures")
        .with_description("Number of failed scoring service calls")
        .build()
}

/// Counter: outbound notifications.
/// Labels: `kind` ("scored" | "challenge" | "duplicate" | "invalid_puzzle"
/// | "unknown_error" | "disqualified").
pub fn notifications_sent() -> Counter<u64> {
    meter()
        .u64_counter("scorebot.notifications.sent")
        .with_description("Number of notification posts sent")
        .build()
}

/// Counter: credential refresh attempts.
/// Labels: `result` ("ok" | "error").
pub fn credential_refreshes() -> Counter<u64> {
    meter()
        .u64_counter("scorebot.credentials.refreshes")
        .with_description("Number of credential refresh attempts")
        .build()
}

/// Histogram: scoring service call duration in milliseconds.
pub fn scoring_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("scorebot.scoring.duration_ms")
        .with_description("Scoring service call duration in milliseconds")
        .with_unit("ms")
        .build()
}
