//! Environment-driven configuration.
//!
//! Settings come from environment variables, with `.env` support for local
//! development. Required: `SMS_API_URL`, `APPOINTMENTS_API_URL`,
//! `APPOINTMENTS_API_KEY`. Everything else has a sensible default.

use std::time::Duration;

use crate::queue::QueueSettings;

/// Worker process configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Redis connection URL.
    pub redis_url: String,
    /// Key namespace of the job queue.
    pub queue_name: String,
    /// Global retry ceiling for jobs without a per-job override.
    pub max_retries: u32,
    /// Base delay in seconds for the retry backoff curve.
    pub retry_delay_secs: u64,
    /// SMS gateway endpoint.
    pub sms_api_url: String,
    /// Practice-management API base URL.
    pub appointments_api_url: String,
    /// Practice-management API key.
    pub appointments_api_key: String,
    /// Per-request timeout for outbound HTTP calls, in seconds.
    pub http_timeout_secs: u64,
    /// Bound on a single handler execution, in seconds.
    pub handler_timeout_secs: u64,
}

impl Settings {
    /// Loads configuration from the environment (and `.env`, if present).
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            queue_name: std::env::var("QUEUE_NAME").unwrap_or_else(|_| "jobs".to_string()),
            max_retries: parse_var("WORKER_MAX_RETRIES", 3)?,
            retry_delay_secs: parse_var("WORKER_RETRY_DELAY_SECS", 60)?,
            sms_api_url: require_var("SMS_API_URL")?,
            appointments_api_url: require_var("APPOINTMENTS_API_URL")?,
            appointments_api_key: require_var("APPOINTMENTS_API_KEY")?,
            http_timeout_secs: parse_var("HTTP_TIMEOUT_SECS", 30)?,
            handler_timeout_secs: parse_var("HANDLER_TIMEOUT_SECS", 300)?,
        })
    }

    /// Queue-global retry configuration derived from these settings.
    #[must_use]
    pub const fn queue_settings(&self) -> QueueSettings {
        QueueSettings {
            max_retries: self.max_retries,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
        }
    }

    /// Per-request timeout for outbound HTTP calls.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Bound on a single handler execution.
    #[must_use]
    pub const fn handler_timeout(&self) -> Duration {
        Duration::from_secs(self.handler_timeout_secs)
    }
}

fn require_var(name: &str) -> anyhow::Result<String> {
    std::env::var(name).map_err(|_| anyhow::anyhow!("{name} environment variable is required"))
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("{name} must be a valid number, got `{raw}`")),
        Err(_) => Ok(default),
    }
}
