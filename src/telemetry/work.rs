//! Drain execution span helpers.
//!
//! One span per work item flowing through a drain cycle.

use tracing::Span;

/// Start a span for processing one work item.
///
/// The `drain.outcome` field is declared empty and filled in via
/// [`record_drain_outcome`] once the state machine finishes.
pub fn start_drain_span(post_id: &str, puzzle_id: &str) -> Span {
    tracing::info_span!(
        "drain.process",
        "drain.post_id" = post_id,
        "drain.puzzle_id" = puzzle_id,
        "drain.outcome" = tracing::field::Empty,
    )
}

/// Record the final outcome on a drain span.
pub fn record_drain_outcome(span: &Span, outcome: &str) {
    span.record("drain.outcome", outcome);
    span.in_scope(|| {
        tracing::info!(outcome, "work item processed");
    });
}
