//! Integration tests for the bounded dispatcher.

use async_trait::async_trait;
use fanout_rs::dispatch::{Dispatcher, MAX_CONCURRENCY, RangeSource, WorkQueue, WorkSource};
use fanout_rs::error::{Error, Result};
use fanout_rs::ops::Operation;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Test operations and sources
// ---------------------------------------------------------------------------

/// Succeeds for even items, fails for odd ones.
struct Parity;

#[async_trait]
impl Operation for Parity {
    type Item = u64;

    async fn call(&self, item: &u64) -> Result<()> {
        if item % 2 == 0 {
            Ok(())
        } else {
            Err(Error::Other(format!("odd item {item}")))
        }
    }
}

struct Always(bool);

#[async_trait]
impl Operation for Always {
    type Item = u64;

    async fn call(&self, _item: &u64) -> Result<()> {
        if self.0 {
            Ok(())
        } else {
            Err(Error::Other("nope".to_string()))
        }
    }
}

/// Records every item it sees and the peak number of concurrent calls.
#[derive(Default)]
struct Recorder {
    seen: Mutex<HashMap<u64, usize>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl Operation for Recorder {
    type Item = u64;

    async fn call(&self, item: &u64) -> Result<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        *self.seen.lock().unwrap().entry(*item).or_default() += 1;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Panics on item 3.
struct Explosive;

#[async_trait]
impl Operation for Explosive {
    type Item = u64;

    async fn call(&self, item: &u64) -> Result<()> {
        if *item == 3 {
            panic!("boom");
        }
        Ok(())
    }
}

/// Yields `good` items and then fails.
struct BrokenSource {
    good: u64,
}

#[async_trait]
impl WorkSource for BrokenSource {
    type Item = u64;

    async fn feed(self, queue: &mut WorkQueue<u64>) -> Result<()> {
        for i in 0..self.good {
            queue.push(i).await?;
        }
        Err(Error::Other("disk on fire".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Counting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn five_items_two_workers_odd_items_fail() {
    let report = Dispatcher::new(Parity, 2)
        .unwrap()
        .run(RangeSource::new(5))
        .await;

    assert_eq!(report.produced, 5);
    assert_eq!(report.completed, 5);
    // Items 1 and 3 of 0..5.
    assert_eq!(report.failed, 2);
    assert_eq!(report.succeeded(), 3);
    assert!(report.source_error.is_none());
}

#[tokio::test]
async fn every_item_yields_one_record_for_any_worker_count() {
    for workers in [1, 2, 3, 8, 64] {
        for total in [0, 1, 7, 100] {
            let report = Dispatcher::new(Parity, workers)
                .unwrap()
                .run(RangeSource::new(total))
                .await;
            assert_eq!(report.produced, total, "workers={workers}");
            assert_eq!(report.completed, total, "workers={workers}");
            assert_eq!(report.failed, total / 2, "workers={workers}");
        }
    }
}

#[tokio::test]
async fn always_succeeding_operation_reports_no_failures() {
    let report = Dispatcher::new(Always(true), 4)
        .unwrap()
        .run(RangeSource::new(50))
        .await;
    assert_eq!(report.completed, 50);
    assert_eq!(report.failed, 0);
}

#[tokio::test]
async fn always_failing_operation_fails_every_item() {
    let report = Dispatcher::new(Always(false), 4)
        .unwrap()
        .run(RangeSource::new(50))
        .await;
    assert_eq!(report.completed, 50);
    assert_eq!(report.failed, 50);
}

#[tokio::test]
async fn single_worker_matches_many_workers() {
    let one = Dispatcher::new(Parity, 1)
        .unwrap()
        .run(RangeSource::new(31))
        .await;
    let many = Dispatcher::new(Parity, 10)
        .unwrap()
        .run(RangeSource::new(31))
        .await;
    assert_eq!(one.completed, many.completed);
    assert_eq!(one.failed, many.failed);
}

// ---------------------------------------------------------------------------
// Pool behavior
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn each_item_is_processed_exactly_once_within_the_worker_bound() {
    let recorder = Arc::new(Recorder::default());
    let dispatcher = Dispatcher::with_shared(Arc::clone(&recorder), 4).unwrap();
    assert_eq!(dispatcher.concurrency(), 4);

    let report = dispatcher.run(RangeSource::new(40)).await;
    assert_eq!(report.completed, 40);

    let seen = recorder.seen.lock().unwrap();
    assert_eq!(seen.len(), 40);
    assert!(seen.values().all(|&count| count == 1));

    let peak = recorder.peak.load(Ordering::SeqCst);
    assert!(peak <= 4, "peak {peak} exceeds worker count");
    assert!(peak > 1, "workers never overlapped");
}

#[tokio::test]
async fn dispatcher_can_run_again_after_finishing() {
    let dispatcher = Dispatcher::new(Parity, 3).unwrap();
    let first = dispatcher.run(RangeSource::new(10)).await;
    let second = dispatcher.clone().run(RangeSource::new(4)).await;
    assert_eq!(first.failed, 5);
    assert_eq!(second.failed, 2);
}

#[tokio::test]
async fn panicking_operation_is_recorded_as_failure() {
    let report = Dispatcher::new(Explosive, 2)
        .unwrap()
        .run(RangeSource::new(6))
        .await;
    assert_eq!(report.completed, 6);
    assert_eq!(report.failed, 1);
}

#[test]
fn zero_concurrency_is_rejected() {
    assert!(matches!(Dispatcher::new(Parity, 0), Err(Error::Config(_))));
}

#[test]
fn oversized_concurrency_is_rejected() {
    assert!(Dispatcher::new(Parity, MAX_CONCURRENCY).is_ok());
    assert!(matches!(
        Dispatcher::new(Parity, MAX_CONCURRENCY + 1),
        Err(Error::Config(_))
    ));
    assert!(matches!(
        Dispatcher::new(Parity, usize::MAX),
        Err(Error::Config(_))
    ));
}

// ---------------------------------------------------------------------------
// Source failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn source_failure_truncates_work_without_crashing() {
    let report = Dispatcher::new(Parity, 2)
        .unwrap()
        .run(BrokenSource { good: 7 })
        .await;

    assert_eq!(report.produced, 7);
    assert_eq!(report.completed, 7);
    assert_eq!(report.failed, 3);
    let err = report.source_error.expect("source error should be reported");
    assert!(err.contains("disk on fire"));
}

#[tokio::test]
async fn source_failing_immediately_yields_no_records() {
    let report = Dispatcher::new(Always(true), 3)
        .unwrap()
        .run(BrokenSource { good: 0 })
        .await;
    assert_eq!(report.produced, 0);
    assert_eq!(report.completed, 0);
    assert!(report.source_error.is_some());
}
