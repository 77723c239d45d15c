//! Aggregator: the single consumer of the result queue.

use crate::model::{Outcome, ResultRecord};
use crate::telemetry::{DIAGNOSTICS_TARGET, metrics};
use opentelemetry::KeyValue;
use std::fmt::Display;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Tally {
    pub completed: u64,
    pub failed: u64,
}

/// Drain `results` until every sender is gone.
pub(crate) async fn aggregate<I: Display>(mut results: mpsc::Receiver<ResultRecord<I>>) -> Tally {
    let completed_counter = metrics::items_completed();
    let mut tally = Tally::default();

    while let Some(record) = results.recv().await {
        tally.completed += 1;
        let label = match &record.outcome {
            Outcome::Success => "success",
            Outcome::Failure(detail) => {
                tally.failed += 1;
                warn!(
                    target: DIAGNOSTICS_TARGET,
                    item = %record.item,
                    error = %detail,
                    "error when processing item"
                );
                "failure"
            }
        };
        completed_counter.add(1, &[KeyValue::new("outcome", label)]);
    }

    info!(
        target: DIAGNOSTICS_TARGET,
        completed = tally.completed,
        failed = tally.failed,
        "total error count: {}",
        tally.failed
    );
    tally
}
