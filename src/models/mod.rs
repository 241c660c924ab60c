//! Data models for the courier worker.
//!
//! This module contains the core data structures shared across the crate:
//! - `Job` - A queued unit of work as it appears on the wire
//! - `JobFailure` - Why a job attempt failed
//! - `SmsPayload` / `CancelAppointmentPayload` - Typed, validated payloads
//! - `BackoffPolicy` - Exponential backoff for failed jobs

/// Wire job model and failure taxonomy.
pub mod job;
/// Typed per-job-type payloads, validated at construction.
pub mod payload;
/// Retry delay computation.
pub mod retry;

pub use job::{Job, JobFailure};
pub use payload::{CancelAppointmentPayload, PayloadError, SmsPayload};
pub use retry::BackoffPolicy;
