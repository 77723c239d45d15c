//! Metric instrument factories for fanout-rs.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"fanout-rs"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for fanout-rs instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("fanout-rs")
}

/// Counter: work items that reached the aggregator.
/// Labels: `outcome` ("success" | "failure").
pub fn items_completed() -> Counter<u64> {
    meter()
        .u64_counter("fanout.items.completed")
        .with_description("Number of work items processed")
        .build()
}

/// Histogram: per-item operation duration in milliseconds.
pub fn item_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("fanout.item.duration_ms")
        .with_description("Per-item operation duration in milliseconds")
        .with_unit("ms")
        .build()
}

/// Counter: work sources that stopped early on a read error.
pub fn source_errors() -> Counter<u64> {
    meter()
        .u64_counter("fanout.source.errors")
        .with_description("Number of work source read failures")
        .build()
}

/// Counter: outbound HTTP calls that got a response.
/// Labels: `http.request.method`, `http.response.status_code`.
pub fn http_calls() -> Counter<u64> {
    meter()
        .u64_counter("fanout.http.calls")
        .with_description("Number of outbound HTTP calls")
        .build()
}
