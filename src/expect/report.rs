//! Failure records and the sinks they are reported to.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::SourceLocation;

/// Category of an expectation failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// A delivered signal did not satisfy its check.
    Check,
    /// A counter was not fulfilled before the wait resolved.
    TimedOut,
    /// A counter that must stay unfulfilled reached its threshold.
    InvertedExpectationViolated,
    /// Declarations were fulfilled out of declaration order.
    OrderViolation,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Check => "check failed",
            Self::TimedOut => "timed out",
            Self::InvertedExpectationViolated => "inverted expectation violated",
            Self::OrderViolation => "order violation",
        })
    }
}

/// One expectation failure, attributed to the declaration's call site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    pub(crate) kind: FailureKind,
    pub(crate) description: String,
    pub(crate) message: Option<String>,
    pub(crate) detail: String,
    pub(crate) location: SourceLocation,
}

impl Failure {
    /// Failure category.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// The declaration that failed, e.g. `expect("cool")`.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Override message given with `with_message`.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// What went wrong.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Where the declaration was made.
    #[must_use]
    pub fn location(&self) -> SourceLocation {
        self.location
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.description)?;
        if let Some(message) = &self.message {
            write!(f, " ({message})")?;
        }
        write!(f, ": {}", self.detail)
    }
}

/// Every failure produced by one wait, in report order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Failures(pub(crate) Vec<Failure>);

impl Failures {
    /// Iterate in report order.
    pub fn iter(&self) -> std::slice::Iter<'_, Failure> {
        self.0.iter()
    }

    /// Number of failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Failures of one kind.
    pub fn of_kind(&self, kind: FailureKind) -> impl Iterator<Item = &Failure> {
        self.0.iter().filter(move |failure| failure.kind == kind)
    }
}

impl fmt::Display for Failures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.len() {
            0 => f.write_str("no expectation failures"),
            1 => write!(f, "1 expectation failed:"),
            n => write!(f, "{n} expectations failed:"),
        }?;
        for failure in &self.0 {
            write!(f, "\n  {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Failures {}

impl IntoIterator for Failures {
    type Item = Failure;
    type IntoIter = std::vec::IntoIter<Failure>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Failures {
    type Item = &'a Failure;
    type IntoIter = std::slice::Iter<'a, Failure>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Sink for expectation failures.
///
/// Each failure is recorded individually, as soon as a wait resolves.
/// Closures taking `&Failure` implement this trait.
pub trait Reporter: Send + Sync {
    /// Record one failure.
    fn record_failure(&self, failure: &Failure);
}

impl<F> Reporter for F
where
    F: Fn(&Failure) + Send + Sync,
{
    fn record_failure(&self, failure: &Failure) {
        self(failure);
    }
}

/// Default sink: one `tracing` warning per failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn record_failure(&self, failure: &Failure) {
        tracing::warn!(
            location = %failure.location,
            kind = ?failure.kind,
            "{}",
            failure
        );
    }
}

/// Collects failures for later inspection.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use streamcheck::expect::{testable, FailureKind, Recorder};
/// use streamcheck::publisher::just;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let recorder = Recorder::new();
/// let outcome = testable(&just("cool"))
///     .expect("neat")
///     .report_to(recorder.clone())
///     .wait(Duration::from_millis(100))
///     .await;
///
/// assert!(outcome.is_err());
/// assert_eq!(recorder.failures()[0].kind(), FailureKind::Check);
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    failures: Arc<Mutex<Vec<Failure>>>,
}

impl Recorder {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded failures.
    #[must_use]
    pub fn failures(&self) -> Vec<Failure> {
        self.failures.lock().clone()
    }

    /// Number of recorded failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.lock().len()
    }

    /// `true` when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.lock().is_empty()
    }
}

impl Reporter for Recorder {
    fn record_failure(&self, failure: &Failure) {
        self.failures.lock().push(failure.clone());
    }
}
