//! Durable job queue interface and its Redis backend.
//!
//! The dispatch loop depends only on the [`JobQueue`] trait; [`RedisQueue`]
//! is the production implementation, and the test suite supplies an
//! in-memory one. The queue is the sole point of mutual exclusion between
//! competing worker processes: whoever pops a job owns that attempt.

mod error;
mod redis;

pub use self::error::QueueError;
pub use self::redis::{QueueSettings, RedisQueue};

use std::time::Duration;

use async_trait::async_trait;

use crate::models::Job;

/// Operations the dispatch loop requires from a queue backend.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Readiness probe, called once at startup. An unavailable queue is the
    /// worker's one fatal condition.
    async fn is_available(&self) -> bool;

    /// Blocking dequeue bounded by `timeout`. Returns `None` when no job
    /// arrived within the bound.
    async fn pop(&self, timeout: Duration) -> Result<Option<Job>, QueueError>;

    /// Attempts to reschedule a failed job.
    ///
    /// Increments the job's retry count, checks it against the effective
    /// retry ceiling, and either re-enqueues the job into the delayed set
    /// with the computed backoff (returning true) or declines (returning
    /// false, retries exhausted).
    async fn retry(&self, job: &Job) -> Result<bool, QueueError>;

    /// Promotes all due delayed jobs into the ready queue. Returns the
    /// number of jobs moved.
    async fn process_delayed_jobs(&self) -> Result<u64, QueueError>;

    /// Global retry ceiling applied to jobs without a per-job override.
    fn max_retries(&self) -> u32;

    /// Base delay feeding the backoff curve.
    fn retry_delay(&self) -> Duration;
}
