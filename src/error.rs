//! Error types for fanout-rs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{context}: {source}")]
    Request {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("got non 200 response, code: {status}, body: {body}")]
    Status { status: u16, body: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("work queue closed")]
    QueueClosed,

    #[error("length mismatch when generating a new id: {0}")]
    IdLength(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn request(context: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Request { context, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
