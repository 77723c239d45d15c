//! Dispatch span helpers.

use tracing::Span;
use uuid::Uuid;

/// Start a span covering one whole dispatch invocation.
///
/// The `dispatch.failed` field is declared empty and filled by
/// [`record_failures`] once the aggregator finishes.
pub fn start_dispatch_span(dispatch_id: &Uuid, concurrency: usize) -> Span {
    tracing::info_span!(
        "dispatch.run",
        "dispatch.id" = %dispatch_id,
        "dispatch.concurrency" = concurrency,
        "dispatch.failed" = tracing::field::Empty,
    )
}

/// Start a span for one worker processing one item.
pub fn start_item_span(worker: usize, item: &dyn std::fmt::Display) -> Span {
    tracing::debug_span!("dispatch.item", "dispatch.worker" = worker, "dispatch.item" = %item)
}

pub fn record_failures(span: &Span, failed: u64) {
    span.record("dispatch.failed", failed);
}
