use std::time::Duration;

/// Exponential backoff for failed jobs.
///
/// The delay before retry attempt `n` (1-based, i.e. the retry that is about
/// to happen) is `base_delay * (2^n - 1)`: with a 2 s base the curve is
/// 2 s, 6 s, 14 s, 30 s. Spacing retries out increasingly keeps a transient
/// downstream outage from turning into a retry storm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base_delay_secs: u64,
}

impl BackoffPolicy {
    /// Creates a policy from the configured base delay.
    #[must_use]
    pub const fn new(base_delay: Duration) -> Self {
        Self {
            base_delay_secs: base_delay.as_secs(),
        }
    }

    /// Returns the configured base delay.
    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        Duration::from_secs(self.base_delay_secs)
    }

    /// Computes the delay before the given retry attempt.
    ///
    /// `attempt` is the retry count after increment, 1-based: attempt 1 is
    /// the first retry and yields exactly the base delay.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        // Cap the exponent; beyond 2^32 the saturated product is already
        // far past any usable delay.
        const MAX_EXP: u32 = 32;
        let factor = 2u64
            .saturating_pow(attempt.min(MAX_EXP))
            .saturating_sub(1);
        Duration::from_secs(self.base_delay_secs.saturating_mul(factor))
    }
}
