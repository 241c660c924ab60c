//! Redis-backed job queue.
//!
//! Layout: a list `{name}:ready` holds immediately-processable jobs
//! (FIFO via `RPUSH`/`BLPOP`), and a sorted set `{name}:delayed` holds
//! jobs scored by their eligible-execution unix time. Jobs are stored as
//! JSON strings.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;
use tracing::debug;

use crate::models::{BackoffPolicy, Job};
use crate::queue::{JobQueue, QueueError};

/// Queue-global retry configuration, applied to jobs without a per-job
/// override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSettings {
    /// Retry ceiling: a job is re-enqueued only while its incremented retry
    /// count stays below this value.
    pub max_retries: u32,
    /// Base delay for the exponential backoff curve.
    pub retry_delay: Duration,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(60),
        }
    }
}

/// A durable job queue on a Redis server.
#[derive(Clone)]
pub struct RedisQueue {
    conn: ConnectionManager,
    name: String,
    settings: QueueSettings,
    backoff: BackoffPolicy,
}

impl RedisQueue {
    /// Connects to Redis and binds the queue to its key namespace.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Redis` if the URL is invalid or the initial
    /// connection cannot be established.
    pub async fn connect(
        url: &str,
        name: impl Into<String>,
        settings: QueueSettings,
    ) -> Result<Self, QueueError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            name: name.into(),
            settings,
            backoff: BackoffPolicy::new(settings.retry_delay),
        })
    }

    fn ready_key(&self) -> String {
        format!("{}:ready", self.name)
    }

    fn delayed_key(&self) -> String {
        format!("{}:delayed", self.name)
    }

    /// Enqueues a new job for immediate processing, assigning its id.
    ///
    /// Producer-side API; the worker itself only re-enqueues via
    /// [`JobQueue::retry`].
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the job cannot be serialized or pushed.
    pub async fn push(
        &self,
        job_type: impl Into<String>,
        data: Value,
    ) -> Result<Job, QueueError> {
        let job = Job::new(job_type, data);
        let mut conn = self.conn.clone();
        let _: i64 = conn
            .rpush(self.ready_key(), serde_json::to_string(&job)?)
            .await?;
        debug!(job_id = %job.id, job_type = %job.job_type, "job enqueued");
        Ok(job)
    }

    /// Enqueues a new job for execution no earlier than `run_at`.
    ///
    /// The job stays in the delayed set until a worker's sweep promotes it.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the job cannot be serialized or stored.
    pub async fn schedule(
        &self,
        job_type: impl Into<String>,
        data: Value,
        run_at: DateTime<Utc>,
    ) -> Result<Job, QueueError> {
        let job = Job::new(job_type, data);
        let mut conn = self.conn.clone();
        let _: i64 = conn
            .zadd(
                self.delayed_key(),
                serde_json::to_string(&job)?,
                run_at.timestamp(),
            )
            .await?;
        debug!(job_id = %job.id, job_type = %job.job_type, %run_at, "job scheduled");
        Ok(job)
    }
}

#[async_trait]
impl JobQueue for RedisQueue {
    async fn is_available(&self) -> bool {
        let mut conn = self.conn.clone();
        let pong: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
        pong.is_ok()
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<Job>, QueueError> {
        let mut conn = self.conn.clone();
        let reply: Option<(String, String)> =
            conn.blpop(self.ready_key(), timeout.as_secs_f64()).await?;
        match reply {
            Some((_key, raw)) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn retry(&self, job: &Job) -> Result<bool, QueueError> {
        let ceiling = job.effective_max_retries(self.settings.max_retries);
        let next = job.retry_count + 1;
        if next >= ceiling {
            return Ok(false);
        }

        let mut retried = job.clone();
        retried.retry_count = next;

        let delay = self.backoff.delay_for_attempt(next);
        let due = Utc::now()
            .timestamp()
            .saturating_add(i64::try_from(delay.as_secs()).unwrap_or(i64::MAX));

        let mut conn = self.conn.clone();
        let _: i64 = conn
            .zadd(
                self.delayed_key(),
                serde_json::to_string(&retried)?,
                due,
            )
            .await?;
        Ok(true)
    }

    async fn process_delayed_jobs(&self) -> Result<u64, QueueError> {
        let mut conn = self.conn.clone();
        let now = Utc::now().timestamp();
        let due: Vec<String> = conn
            .zrangebyscore(self.delayed_key(), "-inf", now)
            .await?;

        let mut moved = 0u64;
        for raw in due {
            // Remove before pushing so a competing worker's sweep cannot
            // promote the same record twice.
            let removed: i64 = conn.zrem(self.delayed_key(), &raw).await?;
            if removed == 0 {
                continue;
            }
            let _: i64 = conn.rpush(self.ready_key(), &raw).await?;
            moved += 1;
        }
        Ok(moved)
    }

    fn max_retries(&self) -> u32 {
        self.settings.max_retries
    }

    fn retry_delay(&self) -> Duration {
        self.settings.retry_delay
    }
}
