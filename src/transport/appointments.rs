use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::debug;

use crate::models::CancelAppointmentPayload;
use crate::transport::TransportError;

/// Appointment management in the practice system.
#[async_trait]
pub trait AppointmentApi: Send + Sync {
    /// Cancels one appointment. Any fault from the practice system is an
    /// error; idempotency of repeated cancellations is the server's concern.
    async fn cancel(&self, request: &CancelAppointmentPayload) -> Result<(), TransportError>;
}

#[derive(Serialize)]
struct CancelRequest<'a> {
    cancellation_note: &'a str,
    cancellation_reason: i64,
    apply_to_repeats: bool,
}

/// Practice-management API client.
///
/// Cancellations go to `PATCH {base}/appointments/{id}/cancel`, authenticated
/// with the configured API key as the basic-auth user.
#[derive(Debug, Clone)]
pub struct HttpAppointmentApi {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl HttpAppointmentApi {
    /// Creates a client for the given API base URL.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidUrl` if the base URL does not parse,
    /// or `TransportError::Request` if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        // A trailing slash matters for Url::join; normalize here so callers
        // can configure the base either way.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url =
            Url::parse(&normalized).map_err(|_| TransportError::InvalidUrl(normalized))?;
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("courier/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn cancel_url(&self, appointment_id: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(&format!("appointments/{appointment_id}/cancel"))
            .map_err(|_| TransportError::InvalidUrl(appointment_id.to_string()))
    }
}

#[async_trait]
impl AppointmentApi for HttpAppointmentApi {
    async fn cancel(&self, request: &CancelAppointmentPayload) -> Result<(), TransportError> {
        let body = CancelRequest {
            cancellation_note: &request.cancellation_note,
            cancellation_reason: request.cancellation_reason,
            apply_to_repeats: request.apply_to_repeats,
        };

        let response = self
            .http
            .patch(self.cancel_url(&request.appointment_id)?)
            .basic_auth(&self.api_key, None::<&str>)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(appointment_id = %request.appointment_id, "cancellation accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
