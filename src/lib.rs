//! courier - fault-tolerant background job worker.
//!
//! Continuously dequeues jobs from a Redis-backed durable queue, routes each
//! to its job-type handler (SMS delivery, appointment cancellation), and
//! reschedules failures with exponential backoff until the retry budget is
//! spent. A periodic sweep promotes delayed jobs into the ready queue. No
//! single job's failure can terminate the worker; the only fatal condition
//! is the queue being unreachable at startup.

pub mod config;
pub mod handlers;
pub mod models;
pub mod queue;
pub mod transport;
pub mod worker;

pub use config::Settings;
pub use models::{BackoffPolicy, CancelAppointmentPayload, Job, JobFailure, SmsPayload};
pub use queue::{JobQueue, QueueError, QueueSettings, RedisQueue};
pub use worker::{
    shutdown_channel, wait_for_shutdown, Dispatcher, JobPayload, QueueUnavailable, RunnerConfig,
    Worker, CANCEL_APPOINTMENT, SEND_SMS,
};
