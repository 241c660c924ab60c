use thiserror::Error;

/// Errors surfaced by queue operations.
///
/// These bubble up to the dispatch loop's per-iteration fault arm, which
/// logs them and pauses briefly instead of terminating the worker.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The Redis backend returned an error.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A stored job could not be encoded or decoded.
    #[error("malformed job record: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A backend-specific failure that is not a protocol error.
    /// Primarily produced by non-Redis implementations of the queue trait.
    #[error("queue backend error: {0}")]
    Backend(String),
}
