//! Error types for the export pipeline.
//!
//! Only query construction and page fetching can fail. Malformed fields inside
//! individual records are absorbed by the normalizer and never surface here.

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The seed query URL could not be turned into a [`QueryDescriptor`](crate::QueryDescriptor).
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid query URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("query URL has no `{param}` parameter")]
    MissingPayload { param: &'static str },

    #[error("query payload is not valid UTF-8 after decoding")]
    PayloadEncoding(#[source] std::string::FromUtf8Error),

    #[error("query payload is not valid JSON: {0}")]
    PayloadJson(#[source] serde_json::Error),

    #[error("query payload must be a JSON object")]
    PayloadNotObject,
}

/// A page request failed. Always fatal for the whole fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection failure, timeout, or other transport-level error.
    #[error("request failed: {}", with_causes(.0))]
    Transport(#[source] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("listing API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the expected JSON envelope.
    #[error("could not decode listing response: {}", with_causes(.0.as_ref()))]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Render an error followed by each of its causes, `outer: inner: root`.
///
/// reqwest keeps the useful part (connection refused, timeout, the serde
/// message) in `source()`, not in its own message.
fn with_causes<E: std::error::Error + ?Sized>(err: &E) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Top-level pipeline error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
