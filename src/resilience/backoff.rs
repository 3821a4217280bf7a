//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    base_ms: u64,
    max_ms: u64,
}

impl Backoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.base_delay_ms, config.max_delay_ms)
    }

    /// Delay before retrying after `attempt` failed attempts.
    ///
    /// Doubles per attempt, capped at `max_ms`, plus up to 10% jitter.
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let factor = 2u64.saturating_pow(attempt - 1);
        let capped = self.base_ms.saturating_mul(factor).min(self.max_ms);

        let jitter_range = capped / 10;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };

        Duration::from_millis(capped.saturating_add(jitter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let backoff = Backoff::new(100, 1000);
        assert_eq!(backoff.delay(0), Duration::ZERO);

        let first = backoff.delay(1).as_millis();
        assert!((100..110).contains(&first));

        let second = backoff.delay(2).as_millis();
        assert!((200..220).contains(&second));

        let capped = backoff.delay(10).as_millis();
        assert!((1000..1100).contains(&capped));
    }

    #[test]
    fn test_huge_attempt_does_not_overflow() {
        let backoff = Backoff::new(u64::MAX / 2, u64::MAX);
        assert!(backoff.delay(200) >= Duration::from_millis(u64::MAX / 2));
    }
}
