//! Bounded retry policy and the sleep seam the scraper waits through.
use async_trait::async_trait;
use std::time::Duration;

/// Cooldown before the first retry of an account (the platform's 15 minute window plus slack).
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(16 * 60);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_MULTIPLIER: u32 = 2;
pub const DEFAULT_MAX_COOLDOWN: Duration = Duration::from_secs(64 * 60);

/// How often, and how patiently, a whole per-account sequence is retried.
///
/// ```
/// use followgraph_scraper::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.delay_for(1), Some(Duration::from_secs(16 * 60)));
/// assert_eq!(policy.delay_for(2), Some(Duration::from_secs(32 * 60)));
/// assert_eq!(policy.delay_for(5), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub cooldown: Duration,
    pub multiplier: u32,
    pub max_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            cooldown: DEFAULT_COOLDOWN,
            multiplier: DEFAULT_MULTIPLIER,
            max_cooldown: DEFAULT_MAX_COOLDOWN,
        }
    }
}

impl RetryPolicy {
    /// Sleep owed after the `failed_attempt`-th (1-based) failure, or `None` once the
    /// attempt budget is spent.
    pub fn delay_for(&self, failed_attempt: u32) -> Option<Duration> {
        if failed_attempt >= self.max_attempts.max(1) {
            return None;
        }
        let factor = self
            .multiplier
            .max(1)
            .saturating_pow(failed_attempt.saturating_sub(1));
        let delay = self
            .cooldown
            .checked_mul(factor)
            .unwrap_or(self.max_cooldown);
        Some(delay.min(self.max_cooldown.max(self.cooldown)))
    }
}

/// Suspension point for backoff. Production code sleeps on the tokio timer; tests
/// substitute a recorder so no real time passes.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
