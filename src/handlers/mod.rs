//! One handler per job type.
//!
//! Handlers are thin: payload validation already happened when the typed
//! payload was constructed, so all that is left is the external call and the
//! conversion of its outcome into a [`JobFailure`](crate::models::JobFailure).
//! No raw transport fault ever crosses a handler's boundary.

mod appointment;
mod sms;

pub use appointment::CancelAppointmentHandler;
pub use sms::SmsHandler;
