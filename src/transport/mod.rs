//! HTTP transports for the external services handlers call.
//!
//! Each transport sits behind a trait so handlers can be exercised against
//! recording fakes in tests. Transports report a plain success/failure
//! boundary: a 2xx response is success, anything else (including connection
//! faults) is a `TransportError`.

mod appointments;
mod sms;

pub use appointments::{AppointmentApi, HttpAppointmentApi};
pub use sms::{HttpSmsSender, SmsSender};

use thiserror::Error;

/// A failed call to an external service.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Status {
        /// HTTP status code of the response.
        status: u16,
        /// Response body, as far as it could be read.
        body: String,
    },

    /// A configured endpoint could not be parsed as a URL.
    #[error("invalid endpoint url `{0}`")]
    InvalidUrl(String),
}
