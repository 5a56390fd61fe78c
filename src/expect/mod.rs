//! Expectations on publishers.
//!
//! Attach to a publisher with [`testable`], chain `expect*` declarations,
//! then wait for them under a deadline:
//!
//! ```rust
//! use std::time::Duration;
//! use streamcheck::expect::{testable, FailureKind};
//! use streamcheck::publisher::sequence;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let outcome = testable(&sequence(vec!["cool", "cool", "cool"]))
//!     .expect_exactly(2, "cool")
//!     .wait(Duration::from_millis(200))
//!     .await;
//!
//! let error = outcome.unwrap_err();
//! let failures = error.failures().unwrap();
//! assert_eq!(failures.len(), 1);
//! assert_eq!(
//!     failures.iter().next().unwrap().kind(),
//!     FailureKind::InvertedExpectationViolated
//! );
//! # }
//! ```
//!
//! Every failure is handed to a [`Reporter`] with the source location of
//! the declaration that produced it, and returned from the wait.

mod expectations;
mod fulfillment;
mod location;
mod options;
mod report;

pub use expectations::{testable, Expectations};
pub use fulfillment::{Fulfilled, Fulfillment};
pub use location::SourceLocation;
pub use options::{WaitOptions, DEFAULT_TIMEOUT};
pub use report::{Failure, FailureKind, Failures, LogReporter, Recorder, Reporter};
