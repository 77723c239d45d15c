//! Bounded concurrent dispatch.
//!
//! One invocation wires four stages together:
//!
//! - a producer task feeding a [`WorkSource`] into the bounded work queue,
//! - `concurrency` workers calling the [`Operation`] once per item,
//! - a supervisor that joins every worker and then drops the last result
//!   sender, closing the result queue,
//! - the aggregator, on the caller's task, tallying failures until that
//!   closure.
//!
//! Both queues hold at most `concurrency` entries. Nothing outlives the call.

mod aggregate;
pub mod source;
mod worker;

pub use source::{LineFileSource, RangeSource, WorkQueue, WorkSource};

use crate::error::{Error, Result};
use crate::model::DispatchReport;
use crate::ops::Operation;
use crate::telemetry::dispatch::{record_failures, start_dispatch_span};
use crate::telemetry::{DIAGNOSTICS_TARGET, metrics};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{Instrument, error, info};
use uuid::Uuid;

/// Largest accepted worker count. Both queues are sized to it.
pub const MAX_CONCURRENCY: usize = 4096;

/// Runs work items through an operation on a fixed-size worker pool.
pub struct Dispatcher<O> {
    operation: Arc<O>,
    concurrency: usize,
}

impl<O> Clone for Dispatcher<O> {
    fn clone(&self) -> Self {
        Self {
            operation: Arc::clone(&self.operation),
            concurrency: self.concurrency,
        }
    }
}

impl<O: Operation> Dispatcher<O> {
    /// Create a dispatcher running `concurrency` workers per invocation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `concurrency` is zero or above
    /// [`MAX_CONCURRENCY`].
    pub fn new(operation: O, concurrency: usize) -> Result<Self> {
        Self::with_shared(Arc::new(operation), concurrency)
    }

    /// Like [`Dispatcher::new`] for an operation that is already shared.
    pub fn with_shared(operation: Arc<O>, concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".to_string()));
        }
        if concurrency > MAX_CONCURRENCY {
            return Err(Error::Config(format!(
                "concurrency {concurrency} exceeds the maximum of {MAX_CONCURRENCY}"
            )));
        }
        Ok(Self {
            operation,
            concurrency,
        })
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Process every item `source` yields and report the outcome counts.
    ///
    /// Per-item failures and source read failures end up in the report;
    /// this never returns early.
    pub async fn run<S>(&self, source: S) -> DispatchReport
    where
        S: WorkSource<Item = O::Item>,
    {
        let dispatch_id = Uuid::new_v4();
        let span = start_dispatch_span(&dispatch_id, self.concurrency);
        self.run_inner(source).instrument(span).await
    }

    async fn run_inner<S>(&self, source: S) -> DispatchReport
    where
        S: WorkSource<Item = O::Item>,
    {
        let start = Instant::now();
        let (work_tx, work_rx) = mpsc::channel(self.concurrency);
        let (result_tx, result_rx) = mpsc::channel(self.concurrency);

        // Producer: owns the only work sender, so returning closes the queue.
        let producer = tokio::spawn(
            async move {
                let mut queue = WorkQueue::new(work_tx);
                let fed = source.feed(&mut queue).await;
                (queue.pushed(), fed)
            }
            .in_current_span(),
        );

        let shared_queue = Arc::new(Mutex::new(work_rx));
        let mut workers = JoinSet::new();
        for worker in 0..self.concurrency {
            workers.spawn(
                worker::run_worker(
                    worker,
                    Arc::clone(&self.operation),
                    Arc::clone(&shared_queue),
                    result_tx.clone(),
                )
                .in_current_span(),
            );
        }
        // If every worker dies the receiver goes with them and the producer stops.
        drop(shared_queue);

        // Supervisor: the result queue closes only after every worker is joined.
        let supervisor = tokio::spawn(
            async move {
                while let Some(joined) = workers.join_next().await {
                    if let Err(e) = joined {
                        error!("worker task failed: {e}");
                    }
                }
                drop(result_tx);
            }
            .in_current_span(),
        );

        let tally = aggregate::aggregate(result_rx).await;

        if let Err(e) = supervisor.await {
            error!("supervisor task failed: {e}");
        }

        let (produced, source_error) = match producer.await {
            Ok((produced, Ok(()))) => (produced, None),
            Ok((produced, Err(e))) => {
                error!(target: DIAGNOSTICS_TARGET, produced, "work source stopped early: {e}");
                metrics::source_errors().add(1, &[]);
                (produced, Some(e.to_string()))
            }
            Err(e) => {
                error!(target: DIAGNOSTICS_TARGET, "producer task failed: {e}");
                metrics::source_errors().add(1, &[]);
                (tally.completed, Some(format!("producer task failed: {e}")))
            }
        };

        record_failures(&tracing::Span::current(), tally.failed);
        let report = DispatchReport {
            produced,
            completed: tally.completed,
            failed: tally.failed,
            source_error,
            elapsed: start.elapsed(),
        };
        info!(
            produced = report.produced,
            failed = report.failed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "dispatch finished"
        );
        report
    }
}
