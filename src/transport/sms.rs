use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::debug;

use crate::models::SmsPayload;
use crate::transport::TransportError;

/// Outbound SMS delivery.
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Delivers one message. Success means the gateway accepted it.
    async fn send(&self, sms: &SmsPayload) -> Result<(), TransportError>;
}

#[derive(Serialize)]
struct SmsRequest<'a> {
    message: &'a str,
    to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a str>,
}

/// SMS gateway client.
///
/// Posts the message to the configured gateway endpoint with the job's
/// per-message bearer token.
#[derive(Debug, Clone)]
pub struct HttpSmsSender {
    http: Client,
    endpoint: Url,
}

impl HttpSmsSender {
    /// Creates a sender for the given gateway endpoint.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidUrl` if the endpoint does not parse,
    /// or `TransportError::Request` if the HTTP client cannot be built.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, TransportError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|_| TransportError::InvalidUrl(endpoint.to_string()))?;
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("courier/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl SmsSender for HttpSmsSender {
    async fn send(&self, sms: &SmsPayload) -> Result<(), TransportError> {
        let body = SmsRequest {
            message: &sms.message,
            to: &sms.phone,
            from: sms.business_name.as_deref(),
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&sms.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(phone = %sms.phone, "gateway accepted message");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
