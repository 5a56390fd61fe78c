//! Deadline racing.
//!
//! [`with_timeout`] runs an operation against a deadline. Whichever side
//! finishes first wins and the other is dropped.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use streamcheck::time::with_timeout;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let answer = with_timeout(Duration::from_secs(1), async { 42 }, || {}).await;
//! assert_eq!(answer.unwrap(), 42);
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

/// Race `operation` against a `duration` deadline.
///
/// # Errors
///
/// - [`Error::InvalidTimeout`] when `duration` is zero. `operation` is
///   never polled in that case.
/// - [`Error::Timeout`] when the deadline passes first. `on_timeout` runs
///   before the error is returned and `operation` is dropped.
pub async fn with_timeout<F, C>(duration: Duration, operation: F, on_timeout: C) -> Result<F::Output>
where
    F: Future,
    C: FnOnce(),
{
    if duration.is_zero() {
        return Err(Error::InvalidTimeout(duration));
    }

    match tokio::time::timeout(duration, operation).await {
        Ok(output) => Ok(output),
        Err(_) => {
            tracing::debug!(?duration, "deadline reached");
            on_timeout();
            Err(Error::Timeout(duration))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_operation_wins() {
        let fired = AtomicBool::new(false);
        let result = with_timeout(
            Duration::from_millis(100),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                "done"
            },
            || fired.store(true, Ordering::SeqCst),
        )
        .await;

        assert_eq!(result.unwrap(), "done");
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_wins() {
        let fired = AtomicBool::new(false);
        let result = with_timeout(
            Duration::from_millis(10),
            futures::future::pending::<()>(),
            || fired.store(true, Ordering::SeqCst),
        )
        .await;

        assert!(matches!(result, Err(Error::Timeout(d)) if d == Duration::from_millis(10)));
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_zero_duration_never_polls() {
        let polled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&polled);
        let result = with_timeout(
            Duration::ZERO,
            async move { flag.store(true, Ordering::SeqCst) },
            || panic!("on_timeout must not run"),
        )
        .await;

        assert!(matches!(result, Err(Error::InvalidTimeout(_))));
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loser_is_dropped() {
        struct Flag(Arc<AtomicBool>);
        impl Drop for Flag {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let dropped = Arc::new(AtomicBool::new(false));
        let guard = Flag(Arc::clone(&dropped));
        let _ = with_timeout(
            Duration::from_millis(5),
            async move {
                let _guard = guard;
                futures::future::pending::<()>().await;
            },
            || {},
        )
        .await;

        assert!(dropped.load(Ordering::SeqCst));
    }
}
