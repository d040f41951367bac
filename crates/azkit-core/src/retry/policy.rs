use std::time::Duration;

/// Linear backoff with a cap: the delay starts at `base_delay`, grows by
/// `increment` after each failed attempt, and never exceeds `max_delay`.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Added to the delay after every further failed attempt.
    pub increment: Duration,
    /// Upper bound on the delay.
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    /// Sized for role-assignment propagation: new grants usually reach the
    /// vault's authorization checks within a couple of minutes, so the
    /// budget covers a little over five minutes of waiting in 12 attempts.
    fn default() -> Self {
        Self {
            max_attempts: 12,
            base_delay: Duration::from_secs(10),
            increment: Duration::from_secs(5),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl BackoffPolicy {
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        increment: Duration,
        max_delay: Duration,
    ) -> Self {
        Self {
            max_attempts,
            base_delay,
            increment,
            max_delay,
        }
    }

    /// Delay to sleep after the `attempt`-th failure (1-based), or `None`
    /// when the attempt budget is spent. The sequence is non-decreasing and
    /// constant once it reaches `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let grown = self.base_delay + self.increment * attempt.saturating_sub(1);
        Some(grown.min(self.max_delay))
    }
}
