//! Worker module: job routing and the dispatch loop.
//!
//! - `Dispatcher` - Routes a job to exactly one handler based on its type
//! - `JobPayload` - Closed union of typed payloads for the known job types
//! - `Worker` / `RunnerConfig` - The dispatch loop and its timing knobs
//! - `shutdown_channel` / `wait_for_shutdown` - Graceful-shutdown plumbing

mod dispatch;
mod runner;
mod signals;

pub use dispatch::{Dispatcher, JobPayload, CANCEL_APPOINTMENT, SEND_SMS};
pub use runner::{QueueUnavailable, RunnerConfig, Worker};
pub use signals::{shutdown_channel, wait_for_shutdown};
