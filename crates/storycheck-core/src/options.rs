//! Per-capture knobs handed to targets.

use std::time::Duration;

/// How long a single capture may take and how often it is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Upper bound for one capture attempt.
    pub timeout: Duration,

    /// Extra attempts after the first failure.
    pub retries: u32,

    /// Pause between attempts.
    pub backoff: Duration,
}

impl CaptureOptions {
    /// Builder method to set the capture timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder method to set the retry count.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Builder method to set the backoff between attempts.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(60_000),
            retries: 0,
            backoff: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CaptureOptions::default();
        assert_eq!(options.timeout, Duration::from_millis(60_000));
        assert_eq!(options.retries, 0);
        assert_eq!(options.backoff, Duration::ZERO);
    }

    #[test]
    fn test_builder_chain() {
        let options = CaptureOptions::default()
            .with_timeout(Duration::from_secs(5))
            .with_retries(2)
            .with_backoff(Duration::from_millis(100));
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.retries, 2);
        assert_eq!(options.backoff, Duration::from_millis(100));
    }
}
