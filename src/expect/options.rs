//! Wait configuration.

use std::time::Duration;

/// Deadline used by [`WaitOptions::default`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration for a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Deadline for every expectation to resolve. Must be non-zero.
    pub timeout: Duration,
    /// Require declarations to be fulfilled in declaration order.
    pub enforce_order: bool,
}

impl WaitOptions {
    /// Options with the given deadline and no order enforcement.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            enforce_order: false,
        }
    }

    /// Set the deadline.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable order enforcement.
    #[must_use]
    pub fn enforce_order(mut self) -> Self {
        self.enforce_order = true;
        self
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl From<Duration> for WaitOptions {
    fn from(timeout: Duration) -> Self {
        Self::new(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_options_builder() {
        let options = WaitOptions::default()
            .timeout(Duration::from_millis(250))
            .enforce_order();

        assert_eq!(options.timeout, Duration::from_millis(250));
        assert!(options.enforce_order);
    }

    #[test]
    fn test_wait_options_default() {
        let options = WaitOptions::default();

        assert_eq!(options.timeout, DEFAULT_TIMEOUT);
        assert!(!options.enforce_order);
    }
}
