//! Worker loop: drain the work queue, call the operation, report one record per item.

use crate::model::{Outcome, ResultRecord};
use crate::ops::Operation;
use crate::telemetry::dispatch::start_item_span;
use crate::telemetry::metrics;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, mpsc};
use tracing::{Instrument, debug};

/// Receiving half of the work queue, shared by every worker.
pub(crate) type SharedWorkQueue<I> = Arc<Mutex<mpsc::Receiver<I>>>;

pub(crate) async fn run_worker<O: Operation>(
    worker: usize,
    operation: Arc<O>,
    queue: SharedWorkQueue<O::Item>,
    results: mpsc::Sender<ResultRecord<O::Item>>,
) {
    let duration = metrics::item_duration_ms();
    let mut processed = 0u64;

    loop {
        // The lock is only held while waiting for the next item.
        let next = queue.lock().await.recv().await;
        let Some(item) = next else { break };

        let start = Instant::now();
        let outcome = process(operation.as_ref(), &item)
            .instrument(start_item_span(worker, &item))
            .await;
        duration.record(start.elapsed().as_secs_f64() * 1000.0, &[]);
        processed += 1;

        if results.send(ResultRecord { item, outcome }).await.is_err() {
            // Only happens if the aggregator is gone.
            break;
        }
    }

    debug!(worker, processed, "worker exiting");
}

/// Run the operation for one item, turning errors and panics into a failure.
async fn process<O: Operation>(operation: &O, item: &O::Item) -> Outcome {
    match AssertUnwindSafe(operation.call(item)).catch_unwind().await {
        Ok(Ok(())) => Outcome::Success,
        Ok(Err(e)) => Outcome::Failure(e.to_string()),
        Err(_) => Outcome::Failure("operation panicked".to_string()),
    }
}
