//! Core data model.
//!
//! A work item is whatever a source yields (a digest, a request number).
//! Each one comes back from a worker as exactly one [`ResultRecord`].

use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Result records
// ---------------------------------------------------------------------------

/// How processing one work item ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(String),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure(detail) => write!(f, "failure: {detail}"),
        }
    }
}

/// One processed work item and its outcome.
#[derive(Debug, Clone)]
pub struct ResultRecord<I> {
    pub item: I,
    pub outcome: Outcome,
}

// ---------------------------------------------------------------------------
// Dispatch report
// ---------------------------------------------------------------------------

/// Summary of one dispatch invocation.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// Items the source put on the work queue.
    pub produced: u64,
    /// Result records the aggregator received. Always equal to `produced`.
    pub completed: u64,
    /// Result records with a failure outcome.
    pub failed: u64,
    /// Set when the source stopped early on a read error.
    pub source_error: Option<String>,
    pub elapsed: Duration,
}

impl DispatchReport {
    pub fn succeeded(&self) -> u64 {
        self.completed - self.failed
    }
}
