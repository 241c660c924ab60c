use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A queued unit of work.
///
/// This is the wire shape stored by the queue backend: producers enqueue it,
/// the worker dequeues it, and the queue re-enqueues it (with an incremented
/// `retry_count`) when an attempt fails. The `id` and `job_type` never change
/// across the lifetime of a job; only `retry_count` does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique identifier, assigned at enqueue time and stable across retries.
    pub id: String,

    /// Type discriminator (e.g. `send_sms`, `cancel_appointment`).
    ///
    /// Open on the wire: the queue accepts any string, and an unknown type
    /// surfaces as a runtime dispatch failure rather than a schema violation.
    #[serde(rename = "type")]
    pub job_type: String,

    /// Handler-specific payload. May be empty; handlers treat missing or
    /// empty required fields as a validation failure, not a crash.
    #[serde(default)]
    pub data: Value,

    /// Number of times this job has been re-enqueued after a failure.
    /// Defaults to 0 when absent on the wire; never decremented.
    #[serde(default)]
    pub retry_count: u32,

    /// Per-job override of the retry ceiling. When absent, the queue's
    /// global configuration applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

impl Job {
    /// Creates a new job with a fresh id and a zeroed retry count.
    #[must_use]
    pub fn new(job_type: impl Into<String>, data: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            job_type: job_type.into(),
            data,
            retry_count: 0,
            max_retries: None,
        }
    }

    /// Returns the retry ceiling for this job, falling back to the queue's
    /// global default when the job carries no override.
    #[must_use]
    pub fn effective_max_retries(&self, default_max: u32) -> u32 {
        self.max_retries.unwrap_or(default_max)
    }

    /// Returns true if this delivery is a re-attempt rather than the first.
    #[must_use]
    pub const fn is_retry(&self) -> bool {
        self.retry_count > 0
    }
}

/// Why a job attempt failed.
///
/// Handlers and the dispatcher convert every failure cause into one of these
/// variants; raw transport or parsing faults never cross the handler
/// boundary. All variants are routed through the same retry path by the
/// dispatch loop, but they are logged and counted distinctly so operators can
/// tell a bad producer from a downstream outage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobFailure {
    /// The job's declared type has no handler. Deterministic; no handler
    /// is invoked.
    UnknownType(String),
    /// A required payload field was missing, empty, or mistyped. The
    /// external call was never attempted.
    InvalidPayload(String),
    /// The downstream call failed (non-success response or connection
    /// fault).
    Transport(String),
    /// Handler execution exceeded the configured bound.
    Timeout,
}

impl JobFailure {
    /// Short machine-readable label for log fields and metric tags.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::UnknownType(_) => "unknown_type",
            Self::InvalidPayload(_) => "invalid_payload",
            Self::Transport(_) => "transport",
            Self::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for JobFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownType(job_type) => write!(f, "unknown job type: {job_type}"),
            Self::InvalidPayload(msg) => write!(f, "invalid payload: {msg}"),
            Self::Transport(msg) => write!(f, "downstream call failed: {msg}"),
            Self::Timeout => write!(f, "handler execution timed out"),
        }
    }
}

impl std::error::Error for JobFailure {}
