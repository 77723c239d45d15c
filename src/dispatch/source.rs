//! Work sources: the producer side of a dispatch.
//!
//! A source pushes items onto a [`WorkQueue`] until it is exhausted or
//! fails. Either way the dispatcher closes the queue afterwards, so a
//! failing source only truncates the work, it never stalls the workers.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

/// Sending half of the bounded work queue, counting what was pushed.
pub struct WorkQueue<I> {
    tx: mpsc::Sender<I>,
    pushed: u64,
}

impl<I> WorkQueue<I> {
    pub(crate) fn new(tx: mpsc::Sender<I>) -> Self {
        Self { tx, pushed: 0 }
    }

    /// Enqueue one item, waiting while the queue is full.
    pub async fn push(&mut self, item: I) -> Result<()> {
        self.tx.send(item).await.map_err(|_| Error::QueueClosed)?;
        self.pushed += 1;
        Ok(())
    }

    /// Number of items enqueued so far.
    pub fn pushed(&self) -> u64 {
        self.pushed
    }
}

/// Something that enumerates a finite sequence of work items.
#[async_trait]
pub trait WorkSource: Send + 'static {
    type Item: Send + 'static;

    /// Push every item onto `queue`. Returning an error stops enumeration;
    /// items already pushed are still processed.
    async fn feed(self, queue: &mut WorkQueue<Self::Item>) -> Result<()>;
}

/// Newline-delimited identifiers read from a text file.
///
/// Lines are trimmed and blank lines skipped.
#[derive(Debug, Clone)]
pub struct LineFileSource {
    path: PathBuf,
}

impl LineFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl WorkSource for LineFileSource {
    type Item = String;

    async fn feed(self, queue: &mut WorkQueue<String>) -> Result<()> {
        let file = tokio::fs::File::open(&self.path).await.map_err(|e| {
            Error::Other(format!("error opening file {}: {e}", self.path.display()))
        })?;
        let mut lines = BufReader::new(file).lines();

        loop {
            let line = lines.next_line().await.map_err(|e| {
                Error::Other(format!("error during scanning {}: {e}", self.path.display()))
            })?;
            let Some(line) = line else { break };
            let id = line.trim();
            if id.is_empty() {
                continue;
            }
            queue.push(id.to_string()).await?;
        }

        debug!(path = %self.path.display(), items = queue.pushed(), "file source exhausted");
        Ok(())
    }
}

/// The integer range `[0, total)`.
#[derive(Debug, Clone, Copy)]
pub struct RangeSource {
    total: u64,
}

impl RangeSource {
    pub fn new(total: u64) -> Self {
        Self { total }
    }
}

#[async_trait]
impl WorkSource for RangeSource {
    type Item = u64;

    async fn feed(self, queue: &mut WorkQueue<u64>) -> Result<()> {
        for i in 0..self.total {
            queue.push(i).await?;
        }
        Ok(())
    }
}
