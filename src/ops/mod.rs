//! Per-item operations: the outbound call a worker makes for each item.

pub mod evaluate;
pub mod registry;

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::fmt::Display;
use std::time::Duration;

pub use evaluate::{BulkEvaluateRequest, EvaluateBulk, EvaluateEntry};
pub use registry::DeleteArtifact;

/// The call made once per work item.
///
/// An `Err` is recorded as a failure for that item; it never aborts the
/// dispatch or its sibling workers.
#[async_trait]
pub trait Operation: Send + Sync + 'static {
    type Item: Display + Send + Sync + 'static;

    async fn call(&self, item: &Self::Item) -> Result<()>;
}

/// HTTP connection handling for an operation's client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Keep idle connections around and reuse them across calls.
    Pooled,
    /// Open a fresh connection for every call.
    NonPooled,
}

impl Transport {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pooled => "pooled",
            Self::NonPooled => "non-pooled",
        }
    }
}

/// Build an HTTP client for the given transport with a per-request timeout.
pub fn build_client(transport: Transport, timeout: Duration) -> Result<reqwest::Client> {
    let builder = reqwest::Client::builder().timeout(timeout);
    let builder = match transport {
        Transport::Pooled => builder,
        Transport::NonPooled => builder.pool_max_idle_per_host(0),
    };
    builder
        .build()
        .map_err(|e| Error::Other(format!("failed to build http client: {e}")))
}
