use std::sync::Arc;

use tracing::{info, warn};

use crate::models::{CancelAppointmentPayload, JobFailure};
use crate::transport::AppointmentApi;

/// Handles `cancel_appointment` jobs against the practice-management API.
pub struct CancelAppointmentHandler {
    api: Arc<dyn AppointmentApi>,
}

impl CancelAppointmentHandler {
    /// Creates a handler over the given API client.
    pub fn new(api: Arc<dyn AppointmentApi>) -> Self {
        Self { api }
    }

    /// Cancels the appointment, converting any downstream fault into a job
    /// failure.
    pub async fn handle(&self, request: &CancelAppointmentPayload) -> Result<(), JobFailure> {
        match self.api.cancel(request).await {
            Ok(()) => {
                info!(appointment_id = %request.appointment_id, "appointment cancelled");
                Ok(())
            }
            Err(err) => {
                warn!(
                    appointment_id = %request.appointment_id,
                    error = %err,
                    "appointment cancellation failed"
                );
                Err(JobFailure::Transport(err.to_string()))
            }
        }
    }
}
