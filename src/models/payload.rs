//! Typed payloads for the known job types.
//!
//! Validation happens here, at construction time: a payload struct can only
//! exist if every semantically required field was present and non-empty in
//! the job's `data`. Handlers therefore never re-check fields; they receive
//! an already-valid payload and only have the downstream call left to fail.

use serde_json::Value;
use thiserror::Error;

use crate::models::JobFailure;

/// Default cancellation reason code applied when the producer omits one.
pub const DEFAULT_CANCELLATION_REASON: i64 = 50;

/// A payload field the producer got wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// A required field was absent, null, or empty.
    #[error("missing or empty required field `{0}`")]
    MissingField(&'static str),
    /// A field was present but not of the expected JSON type.
    #[error("field `{0}` has the wrong type")]
    WrongType(&'static str),
}

impl From<PayloadError> for JobFailure {
    fn from(err: PayloadError) -> Self {
        Self::InvalidPayload(err.to_string())
    }
}

/// Payload for an outbound SMS job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsPayload {
    /// Message body. Required, non-empty.
    pub message: String,
    /// Destination phone number. Required, non-empty.
    pub phone: String,
    /// Per-job gateway authorization token. Required, non-empty.
    pub token: String,
    /// Sender display name. Optional, cosmetic.
    pub business_name: Option<String>,
}

impl SmsPayload {
    /// Parses and validates an SMS payload from a job's `data`.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError` if `message`, `phone`, or `token` is missing,
    /// empty, or not a string.
    pub fn from_data(data: &Value) -> Result<Self, PayloadError> {
        Ok(Self {
            message: require_str(data, "message")?,
            phone: require_str(data, "phone")?,
            token: require_str(data, "token")?,
            business_name: optional_str(data, "businessName"),
        })
    }
}

/// Payload for an appointment-cancellation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelAppointmentPayload {
    /// Identifier of the appointment to cancel. Required, non-empty.
    pub appointment_id: String,
    /// Free-text note attached to the cancellation. Defaults to empty.
    pub cancellation_note: String,
    /// Reason code understood by the appointments API.
    /// Defaults to [`DEFAULT_CANCELLATION_REASON`].
    pub cancellation_reason: i64,
    /// Whether the cancellation applies to the whole recurring series.
    /// Defaults to false.
    pub apply_to_repeats: bool,
}

impl CancelAppointmentPayload {
    /// Parses and validates a cancellation payload from a job's `data`.
    ///
    /// The appointment id may arrive as a string or a bare number; producers
    /// are not consistent about this.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError` if `appointmentId` is missing or empty.
    pub fn from_data(data: &Value) -> Result<Self, PayloadError> {
        let appointment_id = match data.get("appointmentId") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(_)) | Some(Value::Null) | None => {
                return Err(PayloadError::MissingField("appointmentId"))
            }
            Some(_) => return Err(PayloadError::WrongType("appointmentId")),
        };

        Ok(Self {
            appointment_id,
            cancellation_note: optional_str(data, "cancellationNote").unwrap_or_default(),
            cancellation_reason: data
                .get("cancellationReason")
                .and_then(Value::as_i64)
                .unwrap_or(DEFAULT_CANCELLATION_REASON),
            apply_to_repeats: data
                .get("applyToRepeats")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }
}

fn require_str(data: &Value, field: &'static str) -> Result<String, PayloadError> {
    match data.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) | Some(Value::Null) | None => {
            Err(PayloadError::MissingField(field))
        }
        Some(_) => Err(PayloadError::WrongType(field)),
    }
}

fn optional_str(data: &Value, field: &str) -> Option<String> {
    match data.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}
