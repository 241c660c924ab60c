//! The dispatch loop.
//!
//! One logical control flow: sweep the delayed set on a coarse cadence,
//! block on the ready queue with a bounded wait, route whatever arrives,
//! and feed failures into the queue's retry operation. No single job's
//! failure may terminate the loop; the only fatal condition is the queue
//! being unreachable at startup.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::models::{BackoffPolicy, Job};
use crate::queue::{JobQueue, QueueError};
use crate::worker::Dispatcher;

/// The queue collaborator failed its startup readiness probe.
#[derive(Debug, Error)]
#[error("job queue is not available")]
pub struct QueueUnavailable;

/// Timing knobs for the dispatch loop.
///
/// Fields exist mostly so tests can shrink them; production uses the
/// defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Minimum spacing between delayed-job sweeps. The cadence is coarse
    /// and best-effort: a sweep runs late when an iteration overruns,
    /// never early.
    pub sweep_interval: Duration,
    /// Bound on the blocking dequeue.
    pub pop_timeout: Duration,
    /// Cool-down after a loop-level fault, throttling rapid failure loops.
    pub fault_pause: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(5),
            pop_timeout: Duration::from_secs(5),
            fault_pause: Duration::from_secs(1),
        }
    }
}

/// The worker: owns the queue handle and the dispatcher, and drives job
/// execution until shutdown.
pub struct Worker<Q> {
    queue: Arc<Q>,
    dispatcher: Dispatcher,
    config: RunnerConfig,
    backoff: BackoffPolicy,
}

impl<Q: JobQueue> Worker<Q> {
    /// Creates a worker. The backoff curve is derived from the queue's
    /// configured base delay so log lines agree with what the queue
    /// actually schedules.
    pub fn new(queue: Arc<Q>, dispatcher: Dispatcher, config: RunnerConfig) -> Self {
        let backoff = BackoffPolicy::new(queue.retry_delay());
        Self {
            queue,
            dispatcher,
            config,
            backoff,
        }
    }

    /// Runs the dispatch loop until the shutdown flag flips.
    ///
    /// Performs the startup readiness probe first; an unreachable queue is
    /// the one fatal condition and is returned to the caller instead of
    /// being retried. The shutdown flag is checked between iterations, so
    /// an in-flight dequeue/dispatch always completes before exit.
    ///
    /// # Errors
    ///
    /// Returns [`QueueUnavailable`] when the startup probe fails.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<(), QueueUnavailable> {
        if !self.queue.is_available().await {
            return Err(QueueUnavailable);
        }

        info!(
            max_retries = self.queue.max_retries(),
            base_delay_secs = self.queue.retry_delay().as_secs(),
            "worker started; waiting for jobs"
        );

        // Loop-local by design: concurrent loops (e.g. under test) must not
        // share sweep cadence.
        let mut last_sweep = Instant::now();

        loop {
            if *shutdown.borrow() {
                info!("shutdown requested; stopping");
                return Ok(());
            }

            // The per-iteration result: a fault from dequeue, sweep, or
            // retry lands here, gets logged, and costs one cool-down pause
            // instead of the process.
            if let Err(err) = self.tick(&mut last_sweep).await {
                error!(error = %err, "queue iteration failed");
                counter!("courier.loop.faults").increment(1);
                tokio::time::sleep(self.config.fault_pause).await;
            }
        }
    }

    /// One loop iteration: sweep if due, then a bounded dequeue, then
    /// dispatch whatever arrived.
    async fn tick(&self, last_sweep: &mut Instant) -> Result<(), QueueError> {
        if last_sweep.elapsed() >= self.config.sweep_interval {
            let moved = self.queue.process_delayed_jobs().await?;
            if moved > 0 {
                info!(moved, "promoted delayed jobs to the ready queue");
            }
            *last_sweep = Instant::now();
        }

        let Some(job) = self.queue.pop(self.config.pop_timeout).await? else {
            // Dequeue timed out; nothing to do this iteration.
            return Ok(());
        };

        self.process(&job).await
    }

    async fn process(&self, job: &Job) -> Result<(), QueueError> {
        let ceiling = job.effective_max_retries(self.queue.max_retries());
        if job.is_retry() {
            info!(
                job_id = %job.id,
                job_type = %job.job_type,
                retry = job.retry_count,
                max_retries = ceiling,
                "processing job (retry)"
            );
        } else {
            info!(job_id = %job.id, job_type = %job.job_type, "processing job");
        }

        match self.dispatcher.dispatch(job).await {
            Ok(()) => {
                // Completion is implicit: the job is simply not re-enqueued.
                info!(job_id = %job.id, "job completed");
                Ok(())
            }
            Err(failure) => {
                warn!(
                    job_id = %job.id,
                    reason = failure.reason(),
                    error = %failure,
                    "job failed"
                );

                if self.queue.retry(job).await? {
                    let attempt = job.retry_count + 1;
                    let delay = self.backoff.delay_for_attempt(attempt);
                    info!(
                        job_id = %job.id,
                        retry = attempt,
                        delay_secs = delay.as_secs(),
                        "job scheduled for retry"
                    );
                    counter!("courier.jobs.retried", "job_type" => job.job_type.clone())
                        .increment(1);
                } else {
                    error!(
                        job_id = %job.id,
                        retries = job.retry_count,
                        "job exceeded max retries; abandoning"
                    );
                    counter!("courier.jobs.abandoned", "job_type" => job.job_type.clone())
                        .increment(1);
                }
                Ok(())
            }
        }
    }
}
