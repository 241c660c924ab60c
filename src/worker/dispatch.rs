//! Job routing over the closed set of known job types.
//!
//! The wire `type` string is parsed into the [`JobPayload`] union exactly
//! once, here; an unrecognized type is the union's fallback arm and never
//! reaches a handler. Parsing also constructs the typed payload, so
//! validation failures are caught before any external call is attempted.

use std::time::Duration;

use metrics::counter;
use serde_json::Value;
use tokio::time::timeout;
use tracing::warn;

use crate::handlers::{CancelAppointmentHandler, SmsHandler};
use crate::models::{CancelAppointmentPayload, Job, JobFailure, SmsPayload};

/// Wire name of the SMS job type.
pub const SEND_SMS: &str = "send_sms";
/// Wire name of the appointment-cancellation job type.
pub const CANCEL_APPOINTMENT: &str = "cancel_appointment";

/// A job's payload, parsed and validated for its declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPayload {
    /// An outbound SMS.
    SendSms(SmsPayload),
    /// An appointment cancellation.
    CancelAppointment(CancelAppointmentPayload),
}

impl JobPayload {
    /// Parses a wire type/data pair into a typed payload.
    ///
    /// # Errors
    ///
    /// Returns `JobFailure::UnknownType` for a type outside the closed set,
    /// or `JobFailure::InvalidPayload` when a required field is missing or
    /// empty.
    pub fn parse(job_type: &str, data: &Value) -> Result<Self, JobFailure> {
        match job_type {
            SEND_SMS => Ok(Self::SendSms(SmsPayload::from_data(data)?)),
            CANCEL_APPOINTMENT => Ok(Self::CancelAppointment(
                CancelAppointmentPayload::from_data(data)?,
            )),
            other => Err(JobFailure::UnknownType(other.to_string())),
        }
    }
}

/// Routes each job to exactly one handler based on its type.
pub struct Dispatcher {
    sms: SmsHandler,
    appointments: CancelAppointmentHandler,
    handler_timeout: Duration,
}

impl Dispatcher {
    /// Creates a dispatcher over the two job-type handlers.
    ///
    /// `handler_timeout` bounds a single handler execution; a hung
    /// downstream call becomes an ordinary job failure instead of stalling
    /// the loop forever.
    pub fn new(
        sms: SmsHandler,
        appointments: CancelAppointmentHandler,
        handler_timeout: Duration,
    ) -> Self {
        Self {
            sms,
            appointments,
            handler_timeout,
        }
    }

    /// Executes one job attempt.
    ///
    /// Never panics and never lets a raw transport fault escape: every
    /// outcome is either success or a [`JobFailure`] for the loop to feed
    /// into the retry policy.
    ///
    /// # Errors
    ///
    /// Returns the job failure when parsing, validation, the handler, or
    /// the execution bound fails.
    pub async fn dispatch(&self, job: &Job) -> Result<(), JobFailure> {
        let payload = match JobPayload::parse(&job.job_type, &job.data) {
            Ok(payload) => payload,
            Err(failure) => {
                // "bad producer" failures are logged distinctly from
                // downstream outages.
                match &failure {
                    JobFailure::UnknownType(job_type) => {
                        warn!(job_id = %job.id, job_type = %job_type, "unknown job type");
                    }
                    other => {
                        warn!(
                            job_id = %job.id,
                            job_type = %job.job_type,
                            error = %other,
                            "job payload failed validation"
                        );
                    }
                }
                counter!(
                    "courier.jobs.failed",
                    "job_type" => job.job_type.clone(),
                    "reason" => failure.reason()
                )
                .increment(1);
                return Err(failure);
            }
        };

        let outcome = match timeout(self.handler_timeout, self.run_handler(&payload)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(JobFailure::Timeout),
        };

        match &outcome {
            Ok(()) => {
                counter!("courier.jobs.completed", "job_type" => job.job_type.clone())
                    .increment(1);
            }
            Err(failure) => {
                counter!(
                    "courier.jobs.failed",
                    "job_type" => job.job_type.clone(),
                    "reason" => failure.reason()
                )
                .increment(1);
            }
        }
        outcome
    }

    async fn run_handler(&self, payload: &JobPayload) -> Result<(), JobFailure> {
        match payload {
            JobPayload::SendSms(sms) => self.sms.handle(sms).await,
            JobPayload::CancelAppointment(request) => self.appointments.handle(request).await,
        }
    }
}
