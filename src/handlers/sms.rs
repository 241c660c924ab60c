use std::sync::Arc;

use tracing::{info, warn};

use crate::models::{JobFailure, SmsPayload};
use crate::transport::SmsSender;

/// Handles `send_sms` jobs by delivering the message through the gateway.
pub struct SmsHandler {
    sender: Arc<dyn SmsSender>,
}

impl SmsHandler {
    /// Creates a handler over the given transport.
    pub fn new(sender: Arc<dyn SmsSender>) -> Self {
        Self { sender }
    }

    /// Sends the message, converting any transport fault into a job failure.
    pub async fn handle(&self, sms: &SmsPayload) -> Result<(), JobFailure> {
        match self.sender.send(sms).await {
            Ok(()) => {
                info!(phone = %sms.phone, "sms sent");
                Ok(())
            }
            Err(err) => {
                warn!(phone = %sms.phone, error = %err, "sms delivery failed");
                Err(JobFailure::Transport(err.to_string()))
            }
        }
    }
}
