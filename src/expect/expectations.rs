//! The expectation coordinator.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use super::{
    Failure, FailureKind, Failures, Fulfillment, LogReporter, Reporter, SourceLocation,
    WaitOptions,
};
use crate::compare::{compare, render, Comparison, Inspect};
use crate::error::{Error, Result};
use crate::publisher::{Completion, Publisher, Subscription};
use crate::time::with_timeout;

/// Attach expectations to `publisher`.
///
/// Subscribes once, immediately. Signals emitted from this point on are
/// buffered by the subscription until the wait consumes them.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use streamcheck::expect::testable;
/// use streamcheck::publisher::just;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// testable(&just("cool"))
///     .expect("cool")
///     .expect_success()
///     .wait(Duration::from_secs(1))
///     .await
///     .unwrap();
/// # }
/// ```
pub fn testable<P: Publisher>(publisher: &P) -> Expectations<P::Output, P::Failure> {
    Expectations::new(publisher.subscribe())
}

/// A chain of expectations on one subscription.
///
/// Built with the `expect*` methods, then consumed by one of
/// [`wait`](Self::wait), [`wait_in_order`](Self::wait_in_order),
/// [`wait_with`](Self::wait_with) or [`verify`](Self::verify).
///
/// Every declaration gets one or more [`Fulfillment`] counters. A wait
/// resolves when the publisher terminates, when every required counter is
/// fulfilled and no inverted counter is registered, or at the deadline,
/// whichever comes first. Each declaration records the location of the
/// `expect*` call so failures point back at it.
pub struct Expectations<T, E> {
    subscription: Subscription<T, E>,
    declarations: Vec<Declaration>,
    observers: Vec<Observer<T, E>>,
    journal: Arc<Journal>,
    reporter: Arc<dyn Reporter>,
}

/// A signal fanned out to observers.
enum Signal<'a, T, E> {
    Value(&'a T),
    Completion(&'a Completion<E>),
}

type Observer<T, E> = Box<dyn FnMut(Signal<'_, T, E>) + Send>;

struct Declaration {
    description: String,
    message: Option<String>,
    location: SourceLocation,
    counters: Vec<Arc<Fulfillment>>,
}

impl Declaration {
    fn failure(&self, kind: FailureKind, detail: String) -> Failure {
        Failure {
            kind,
            description: self.description.clone(),
            message: self.message.clone(),
            detail,
            location: self.location,
        }
    }

    /// Takes part in the order check.
    fn is_ordered(&self) -> bool {
        self.counters
            .iter()
            .any(|counter| !counter.is_inverted() && counter.expected() > 0)
    }
}

/// What the driver observed, shared with the probes.
#[derive(Default)]
struct Journal {
    checks: Mutex<Vec<(usize, String)>>,
    order: Mutex<Vec<usize>>,
    terminal: Mutex<Option<&'static str>>,
}

/// An observer's handle on its own declaration.
struct Probe {
    index: usize,
    counters: Vec<Arc<Fulfillment>>,
    journal: Arc<Journal>,
}

impl Probe {
    fn fulfill(&self) {
        for counter in &self.counters {
            if counter.fulfill() && !counter.is_inverted() {
                self.journal.order.lock().push(self.index);
            }
        }
    }

    fn mismatch(&self, detail: String) {
        self.journal.checks.lock().push((self.index, detail));
    }
}

impl<T, E> Expectations<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Attach to an already opened subscription.
    #[must_use]
    pub fn new(subscription: Subscription<T, E>) -> Self {
        Self {
            subscription,
            declarations: Vec::new(),
            observers: Vec::new(),
            journal: Arc::default(),
            reporter: Arc::new(LogReporter),
        }
    }

    /// Attach to any stream of `Result<T, E>`.
    #[must_use]
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = std::result::Result<T, E>> + Send + 'static,
    {
        Self::new(stream.boxed())
    }

    /// Number of declarations so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// `true` before the first declaration.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Send failures to `reporter` instead of the default [`LogReporter`].
    #[must_use]
    pub fn report_to<R: Reporter + 'static>(mut self, reporter: R) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Replace the message of the most recent declaration.
    ///
    /// Does nothing before the first declaration.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        if let Some(last) = self.declarations.last_mut() {
            last.message = Some(message.into());
        }
        self
    }

    /// Attribute the most recent declaration to `location`.
    ///
    /// Useful for helpers that declare expectations on behalf of their
    /// caller without `#[track_caller]`.
    #[must_use]
    pub fn located_at(mut self, location: SourceLocation) -> Self {
        if let Some(last) = self.declarations.last_mut() {
            last.location = location;
        }
        self
    }

    /// Expect no value to be delivered.
    #[must_use]
    #[track_caller]
    pub fn expect_no_value(self) -> Self {
        self.declare(
            "expect_no_value()".into(),
            vec![Fulfillment::inverted(1)],
            SourceLocation::caller(),
            |probe, signal| {
                if let Signal::Value(_) = signal {
                    probe.fulfill();
                }
            },
        )
    }

    /// Expect the publisher to terminate, either way.
    #[must_use]
    #[track_caller]
    pub fn expect_completion(self) -> Self {
        self.declare(
            "expect_completion()".into(),
            vec![Fulfillment::new(1)],
            SourceLocation::caller(),
            |probe, signal| {
                if let Signal::Completion(_) = signal {
                    probe.fulfill();
                }
            },
        )
    }

    /// Expect the publisher not to terminate.
    #[must_use]
    #[track_caller]
    pub fn expect_no_completion(self) -> Self {
        self.declare(
            "expect_no_completion()".into(),
            vec![Fulfillment::inverted(1)],
            SourceLocation::caller(),
            |probe, signal| {
                if let Signal::Completion(_) = signal {
                    probe.fulfill();
                }
            },
        )
    }

    /// Expect a termination that satisfies `predicate`.
    #[must_use]
    #[track_caller]
    pub fn expect_completion_that<F>(self, mut predicate: F) -> Self
    where
        F: FnMut(&Completion<E>) -> bool + Send + 'static,
    {
        self.declare(
            "expect_completion_that(..)".into(),
            vec![Fulfillment::new(1)],
            SourceLocation::caller(),
            move |probe, signal| {
                if let Signal::Completion(completion) = signal {
                    if !predicate(completion) {
                        probe.mismatch(format!(
                            "predicate rejected the {} completion",
                            completion.label()
                        ));
                    }
                    probe.fulfill();
                }
            },
        )
    }

    /// Expect the publisher to finish without error.
    #[must_use]
    #[track_caller]
    pub fn expect_success(self) -> Self {
        self.declare(
            "expect_success()".into(),
            vec![Fulfillment::new(1)],
            SourceLocation::caller(),
            |probe, signal| {
                if let Signal::Completion(Completion::Finished) = signal {
                    probe.fulfill();
                }
            },
        )
    }

    /// Expect the publisher to fail.
    #[must_use]
    #[track_caller]
    pub fn expect_failure(self) -> Self {
        self.declare(
            "expect_failure()".into(),
            vec![Fulfillment::new(1)],
            SourceLocation::caller(),
            |probe, signal| {
                if let Signal::Completion(Completion::Failed(_)) = signal {
                    probe.fulfill();
                }
            },
        )
    }

    /// Expect the publisher to fail with an error that satisfies
    /// `predicate`.
    #[must_use]
    #[track_caller]
    pub fn expect_failure_that<F>(self, mut predicate: F) -> Self
    where
        F: FnMut(&E) -> bool + Send + 'static,
    {
        self.declare(
            "expect_failure_that(..)".into(),
            vec![Fulfillment::new(1)],
            SourceLocation::caller(),
            move |probe, signal| {
                if let Signal::Completion(Completion::Failed(error)) = signal {
                    if !predicate(error) {
                        probe.mismatch("predicate rejected the failure".into());
                    }
                    probe.fulfill();
                }
            },
        )
    }

    /// Wait up to `timeout` for every expectation, in any order.
    ///
    /// # Errors
    ///
    /// [`Error::Expectations`] with every failure, in report order.
    ///
    /// # Panics
    ///
    /// Panics if `timeout` is zero, if called outside a Tokio runtime, or
    /// if a predicate panicked while the wait was running.
    pub async fn wait(self, timeout: Duration) -> Result<()> {
        self.wait_with(WaitOptions::new(timeout)).await
    }

    /// Like [`wait`](Self::wait), and also require declarations to be
    /// fulfilled in declaration order.
    ///
    /// # Errors
    ///
    /// [`Error::Expectations`] with every failure, in report order.
    ///
    /// # Panics
    ///
    /// See [`wait`](Self::wait).
    pub async fn wait_in_order(self, timeout: Duration) -> Result<()> {
        self.wait_with(WaitOptions::new(timeout).enforce_order()).await
    }

    /// Wait with explicit [`WaitOptions`].
    ///
    /// # Errors
    ///
    /// [`Error::Expectations`] with every failure, in report order.
    ///
    /// # Panics
    ///
    /// See [`wait`](Self::wait).
    pub async fn wait_with(self, options: WaitOptions) -> Result<()> {
        let WaitOptions {
            timeout,
            enforce_order,
        } = options;
        if timeout.is_zero() {
            panic!("{}", Error::InvalidTimeout(timeout));
        }

        let Self {
            subscription,
            declarations,
            observers,
            journal,
            reporter,
        } = self;
        tracing::debug!(
            declarations = declarations.len(),
            ?timeout,
            enforce_order,
            "waiting for expectations"
        );

        let terminated = Arc::new(Fulfillment::new(1));
        // Aborted on drop too, so a cancelled wait releases the subscription.
        let mut driver = AbortOnDrop(tokio::spawn(drive(
            subscription,
            observers,
            Arc::clone(&journal),
            Arc::clone(&terminated),
        )));

        let counters = || declarations.iter().flat_map(|d| d.counters.iter());
        let required: Vec<_> = counters()
            .filter(|counter| !counter.is_inverted())
            .map(|counter| counter.fulfilled())
            .collect();
        let watches_inverted = counters().any(|counter| counter.is_inverted());

        let all_required = async move {
            future::join_all(required).await;
            if watches_inverted {
                future::pending::<()>().await;
            }
        };
        let upstream_done = terminated.fulfilled();
        let settled = async move {
            tokio::select! {
                () = upstream_done => {}
                () = all_required => {}
            }
        };
        let timed_out = with_timeout(timeout, settled, || {
            tracing::debug!(?timeout, "expectations reached their deadline");
        })
        .await
        .is_err();

        driver.0.abort();
        if let Err(error) = (&mut driver.0).await {
            if error.is_panic() {
                std::panic::resume_unwind(error.into_panic());
            }
        }

        let failures = collect_failures(&declarations, &journal, timeout, timed_out, enforce_order);
        for failure in &failures {
            reporter.record_failure(failure);
        }
        tracing::debug!(failures = failures.len(), timed_out, "expectations resolved");

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Expectations(Failures(failures)))
        }
    }

    /// Wait like [`wait`](Self::wait) and panic on any failure.
    ///
    /// # Panics
    ///
    /// Panics listing every failure, and in the cases [`wait`](Self::wait)
    /// panics.
    pub async fn verify(self, timeout: Duration) {
        if let Err(error) = self.wait(timeout).await {
            panic!("{error}");
        }
    }

    fn declare<F>(
        mut self,
        description: String,
        counters: Vec<Fulfillment>,
        location: SourceLocation,
        mut observer: F,
    ) -> Self
    where
        F: FnMut(&Probe, Signal<'_, T, E>) + Send + 'static,
    {
        let counters: Vec<_> = counters.into_iter().map(Arc::new).collect();
        let probe = Probe {
            index: self.declarations.len(),
            counters: counters.clone(),
            journal: Arc::clone(&self.journal),
        };
        self.declarations.push(Declaration {
            description,
            message: None,
            location,
            counters,
        });
        self.observers
            .push(Box::new(move |signal: Signal<'_, T, E>| observer(&probe, signal)));
        self
    }
}

impl<T, E> Expectations<T, E>
where
    T: Inspect + Send + 'static,
    E: Send + 'static,
{
    /// Expect a value structurally equal to `expected`.
    ///
    /// Every delivered value is checked and counts towards fulfillment,
    /// including values that fail the check.
    #[must_use]
    #[track_caller]
    pub fn expect(self, expected: T) -> Self {
        self.declare(
            format!("expect({})", render(&expected)),
            vec![Fulfillment::new(1)],
            SourceLocation::caller(),
            move |probe, signal| {
                if let Signal::Value(value) = signal {
                    check_equal(probe, value, &expected);
                    probe.fulfill();
                }
            },
        )
    }

    /// Expect a value that differs from `unexpected`.
    #[must_use]
    #[track_caller]
    pub fn expect_not(self, unexpected: T) -> Self {
        self.declare(
            format!("expect_not({})", render(&unexpected)),
            vec![Fulfillment::new(1)],
            SourceLocation::caller(),
            move |probe, signal| {
                if let Signal::Value(value) = signal {
                    check_not_equal(probe, value, &unexpected);
                    probe.fulfill();
                }
            },
        )
    }

    /// Expect a value that satisfies `predicate`.
    #[must_use]
    #[track_caller]
    pub fn expect_that<F>(self, mut predicate: F) -> Self
    where
        F: FnMut(&T) -> bool + Send + 'static,
    {
        self.declare(
            "expect_that(..)".into(),
            vec![Fulfillment::new(1)],
            SourceLocation::caller(),
            move |probe, signal| {
                if let Signal::Value(value) = signal {
                    if !predicate(value) {
                        probe.mismatch(format!("predicate rejected {}", render(value)));
                    }
                    probe.fulfill();
                }
            },
        )
    }

    /// Expect exactly `count` values, each equal to `expected`.
    ///
    /// Fewer values is reported as a timeout, more as an inverted
    /// expectation violation.
    #[must_use]
    #[track_caller]
    pub fn expect_exactly(self, count: usize, expected: T) -> Self {
        self.declare(
            format!("expect_exactly({count}, {})", render(&expected)),
            exactly(count),
            SourceLocation::caller(),
            move |probe, signal| {
                if let Signal::Value(value) = signal {
                    check_equal(probe, value, &expected);
                    probe.fulfill();
                }
            },
        )
    }

    /// Expect exactly `count` values, each satisfying `predicate`.
    #[must_use]
    #[track_caller]
    pub fn expect_exactly_that<F>(self, count: usize, mut predicate: F) -> Self
    where
        F: FnMut(&T) -> bool + Send + 'static,
    {
        self.declare(
            format!("expect_exactly_that({count}, ..)"),
            exactly(count),
            SourceLocation::caller(),
            move |probe, signal| {
                if let Signal::Value(value) = signal {
                    if !predicate(value) {
                        probe.mismatch(format!("predicate rejected {}", render(value)));
                    }
                    probe.fulfill();
                }
            },
        )
    }
}

impl<E> Expectations<(), E>
where
    E: Send + 'static,
{
    /// Expect any emission from a publisher of `()`.
    #[must_use]
    #[track_caller]
    pub fn expect_void(self) -> Self {
        self.declare(
            "expect_void()".into(),
            vec![Fulfillment::new(1)],
            SourceLocation::caller(),
            |probe, signal| {
                if let Signal::Value(_) = signal {
                    probe.fulfill();
                }
            },
        )
    }
}

impl<T, E> Expectations<T, E>
where
    T: Send + 'static,
    E: Inspect + Send + 'static,
{
    /// Expect a failure structurally equal to `expected`.
    #[must_use]
    #[track_caller]
    pub fn expect_failure_equal(self, expected: E) -> Self {
        self.declare(
            format!("expect_failure_equal({})", render(&expected)),
            vec![Fulfillment::new(1)],
            SourceLocation::caller(),
            move |probe, signal| {
                if let Signal::Completion(Completion::Failed(error)) = signal {
                    check_equal(probe, error, &expected);
                    probe.fulfill();
                }
            },
        )
    }

    /// Expect a failure that differs from `unexpected`.
    #[must_use]
    #[track_caller]
    pub fn expect_failure_not_equal(self, unexpected: E) -> Self {
        self.declare(
            format!("expect_failure_not_equal({})", render(&unexpected)),
            vec![Fulfillment::new(1)],
            SourceLocation::caller(),
            move |probe, signal| {
                if let Signal::Completion(Completion::Failed(error)) = signal {
                    check_not_equal(probe, error, &unexpected);
                    probe.fulfill();
                }
            },
        )
    }
}

impl<T, E> fmt::Debug for Expectations<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expectations")
            .field(
                "declarations",
                &self
                    .declarations
                    .iter()
                    .map(|d| d.description.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// A required counter for `count` plus a forbidden one for `count + 1`.
///
/// `usize::MAX` has no surplus to forbid, so only the required counter is kept.
fn exactly(count: usize) -> Vec<Fulfillment> {
    let mut counters = vec![Fulfillment::new(count)];
    if let Some(limit) = count.checked_add(1) {
        counters.push(Fulfillment::inverted(limit));
    }
    counters
}

fn check_equal<V: Inspect>(probe: &Probe, received: &V, expected: &V) {
    if let Comparison::Unequal(difference) = compare(received, expected) {
        probe.mismatch(format!("received {}; {difference}", render(received)));
    }
}

fn check_not_equal<V: Inspect>(probe: &Probe, received: &V, unexpected: &V) {
    if compare(received, unexpected).is_equal() {
        probe.mismatch(format!("received {}, which is equal", render(received)));
    }
}

/// Consume the subscription, fanning every signal out in declaration order.
async fn drive<T, E>(
    mut subscription: Subscription<T, E>,
    mut observers: Vec<Observer<T, E>>,
    journal: Arc<Journal>,
    terminated: Arc<Fulfillment>,
) {
    // Fulfilled on return, abort or panic alike.
    let _terminated = TerminateOnDrop(terminated);

    let completion = loop {
        match subscription.next().await {
            Some(Ok(value)) => {
                tracing::trace!(observers = observers.len(), "value delivered");
                for observer in &mut observers {
                    observer(Signal::Value(&value));
                }
            }
            Some(Err(error)) => break Completion::Failed(error),
            None => break Completion::Finished,
        }
    };
    drop(subscription);

    tracing::trace!(completion = completion.label(), "publisher terminated");
    *journal.terminal.lock() = Some(completion.label());
    for observer in &mut observers {
        observer(Signal::Completion(&completion));
    }
}

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct TerminateOnDrop(Arc<Fulfillment>);

impl Drop for TerminateOnDrop {
    fn drop(&mut self) {
        self.0.fulfill();
    }
}

fn collect_failures(
    declarations: &[Declaration],
    journal: &Journal,
    timeout: Duration,
    timed_out: bool,
    enforce_order: bool,
) -> Vec<Failure> {
    let terminal = *journal.terminal.lock();
    let mut failures: Vec<_> = std::mem::take(&mut *journal.checks.lock())
        .into_iter()
        .map(|(index, detail)| declarations[index].failure(FailureKind::Check, detail))
        .collect();

    for declaration in declarations {
        for counter in &declaration.counters {
            let (count, expected) = (counter.count(), counter.expected());
            if !counter.is_inverted() && !counter.is_fulfilled() {
                let detail = match terminal {
                    Some(label) if !timed_out => {
                        format!("publisher {label} after fulfilling {count} of {expected}")
                    }
                    _ => format!("timed out after {timeout:?}; fulfilled {count} of {expected}"),
                };
                failures.push(declaration.failure(FailureKind::TimedOut, detail));
            } else if counter.is_inverted() && counter.is_fulfilled() {
                let detail = format!("occurred {count} times; the limit is {}", expected - 1);
                failures.push(declaration.failure(FailureKind::InvertedExpectationViolated, detail));
            }
        }
    }

    let all_required = declarations
        .iter()
        .flat_map(|d| d.counters.iter())
        .filter(|counter| !counter.is_inverted())
        .all(|counter| counter.is_fulfilled());
    if enforce_order && all_required {
        failures.extend(order_violation(declarations, &journal.order.lock()));
    }
    failures
}

/// First declaration fulfilled out of turn, if any.
fn order_violation(declarations: &[Declaration], fulfilled: &[usize]) -> Option<Failure> {
    let declared = declarations
        .iter()
        .enumerate()
        .filter(|(_, declaration)| declaration.is_ordered())
        .map(|(index, _)| index);

    declared
        .zip(fulfilled)
        .find(|(expected, actual)| expected != *actual)
        .map(|(expected, &actual)| {
            declarations[expected].failure(
                FailureKind::OrderViolation,
                format!(
                    "fulfilled out of order: {} was fulfilled first",
                    declarations[actual].description
                ),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::{just, never, sequence, Subject};

    const TIMEOUT: Duration = Duration::from_millis(100);

    fn kinds(result: Result<()>) -> Vec<FailureKind> {
        match result {
            Ok(()) => Vec::new(),
            Err(Error::Expectations(failures)) => failures.iter().map(Failure::kind).collect(),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_matching_value_and_success() {
        let result = testable(&just("cool"))
            .expect("cool")
            .expect_success()
            .wait(TIMEOUT)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_mismatch_is_reported_at_declaration() {
        let line = line!() + 1;
        let result = testable(&just("cool")).expect("neat").wait(TIMEOUT).await;

        let error = result.unwrap_err();
        let failures = error.failures().unwrap();
        assert_eq!(failures.len(), 1);

        let failure = failures.iter().next().unwrap();
        assert_eq!(failure.kind(), FailureKind::Check);
        assert_eq!(failure.location().line(), line);
        assert_eq!(failure.description(), "expect(\"neat\")");
        assert!(failure.detail().contains("received \"cool\""));
    }

    #[tokio::test]
    async fn test_exactly_catches_surplus() {
        let result = testable(&sequence(vec!["cool", "cool", "cool"]))
            .expect_exactly(2, "cool")
            .wait(TIMEOUT)
            .await;
        assert_eq!(kinds(result), vec![FailureKind::InvertedExpectationViolated]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_value_violated_on_open_publisher_at_deadline() {
        let subject = Subject::<i32, ()>::new();
        let expectations = testable(&subject).expect_no_value();
        subject.send(1);

        let started = tokio::time::Instant::now();
        let result = expectations.wait(TIMEOUT).await;
        assert!(started.elapsed() >= TIMEOUT);
        assert_eq!(kinds(result), vec![FailureKind::InvertedExpectationViolated]);
        assert_eq!(subject.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_no_value_then_completion_on_emitting_publisher() {
        let result = testable(&sequence(vec![1, 2]))
            .expect_no_value()
            .expect_completion()
            .wait(TIMEOUT)
            .await;
        assert_eq!(kinds(result), vec![FailureKind::InvertedExpectationViolated]);
    }

    #[test]
    fn test_exactly_max_count_has_no_surplus_counter() {
        let counters = exactly(usize::MAX);
        assert_eq!(counters.len(), 1);
        assert!(!counters[0].is_inverted());

        let counters = exactly(2);
        assert_eq!(counters.len(), 2);
        assert_eq!(counters[1].expected(), 3);
        assert!(counters[1].is_inverted());
    }

    #[tokio::test]
    async fn test_exactly_max_count_builds_declaration() {
        let expectations = testable(&just(1)).expect_exactly(usize::MAX, 1);
        assert_eq!(expectations.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_wait_releases_subscription() {
        let subject = Subject::<i32, ()>::new();
        let wait = testable(&subject).expect(1).wait(Duration::from_secs(60));
        assert_eq!(subject.subscriber_count(), 1);

        let outcome = tokio::time::timeout(Duration::from_millis(10), wait).await;
        assert!(outcome.is_err());

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(subject.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_exactly_catches_shortfall() {
        let result = testable(&sequence(vec![1]))
            .expect_exactly(2, 1)
            .wait(TIMEOUT)
            .await;

        let error = result.unwrap_err();
        let failure = error.failures().unwrap().iter().next().unwrap().clone();
        assert_eq!(failure.kind(), FailureKind::TimedOut);
        assert_eq!(failure.detail(), "publisher finished after fulfilling 1 of 2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_value_on_silent_publisher_waits_out_deadline() {
        let started = tokio::time::Instant::now();
        let result = testable(&never::<i32>())
            .expect_no_value()
            .wait(TIMEOUT)
            .await;

        assert!(result.is_ok());
        assert!(started.elapsed() >= TIMEOUT);
    }

    #[tokio::test]
    async fn test_no_value_violated() {
        let result = testable(&just(3)).expect_no_value().wait(TIMEOUT).await;
        assert_eq!(kinds(result), vec![FailureKind::InvertedExpectationViolated]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unfulfilled_value_times_out() {
        let result = testable(&never::<i32>()).expect(1).wait(TIMEOUT).await;

        let error = result.unwrap_err();
        let failure = error.failures().unwrap().iter().next().unwrap().clone();
        assert_eq!(failure.kind(), FailureKind::TimedOut);
        assert_eq!(failure.detail(), "timed out after 100ms; fulfilled 0 of 1");
    }

    #[tokio::test]
    async fn test_order_violation() {
        let result = testable(&just("cool"))
            .expect_success()
            .expect("cool")
            .wait_in_order(TIMEOUT)
            .await;

        let error = result.unwrap_err();
        let failures = error.failures().unwrap();
        assert_eq!(failures.len(), 1);
        let failure = failures.iter().next().unwrap();
        assert_eq!(failure.kind(), FailureKind::OrderViolation);
        assert_eq!(failure.description(), "expect_success()");
    }

    #[tokio::test]
    async fn test_order_unchecked_by_default() {
        let result = testable(&just("cool"))
            .expect_success()
            .expect("cool")
            .wait(TIMEOUT)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_failure_assertions() {
        let publisher = sequence(Vec::<i32>::new()).failing_with(String::from("disk full"));
        let result = testable(&publisher)
            .expect_failure()
            .expect_failure_equal("disk full".into())
            .expect_failure_not_equal("no route".into())
            .expect_failure_that(|error| error.starts_with("disk"))
            .expect_completion()
            .wait(TIMEOUT)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_success_not_fulfilled_by_failure() {
        let publisher = sequence(Vec::<i32>::new()).failing_with("boom");
        let result = testable(&publisher).expect_success().wait(TIMEOUT).await;

        let error = result.unwrap_err();
        let failure = error.failures().unwrap().iter().next().unwrap().clone();
        assert_eq!(failure.kind(), FailureKind::TimedOut);
        assert!(failure.detail().starts_with("publisher failed"));
    }

    #[tokio::test]
    async fn test_message_override() {
        let result = testable(&just(1))
            .expect(2)
            .with_message("totals must match")
            .wait(TIMEOUT)
            .await;

        let error = result.unwrap_err();
        let failure = error.failures().unwrap().iter().next().unwrap().clone();
        assert_eq!(failure.message(), Some("totals must match"));
    }

    #[tokio::test]
    async fn test_void_emissions() {
        let subject = Subject::<(), ()>::new();
        let expectations = testable(&subject).expect_void().expect_no_completion();
        subject.send(());

        let result = expectations.wait(TIMEOUT).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_subscription_released_after_wait() {
        let subject = Subject::<i32, ()>::new();
        let expectations = testable(&subject).expect(5);
        subject.send(5);

        expectations.wait(TIMEOUT).await.unwrap();
        assert_eq!(subject.subscriber_count(), 0);
    }

    #[tokio::test]
    #[should_panic(expected = "Invalid timeout")]
    async fn test_zero_timeout_panics() {
        let _ = testable(&just(1)).expect(1).wait(Duration::ZERO).await;
    }

    #[tokio::test]
    #[should_panic(expected = "predicate exploded")]
    async fn test_predicate_panic_is_propagated() {
        let _ = testable(&just(1))
            .expect_that(|_| panic!("predicate exploded"))
            .wait(TIMEOUT)
            .await;
    }

    #[test]
    fn test_debug_lists_declarations() {
        let expectations = testable(&just(1)).expect(1).expect_success();
        let debug = format!("{expectations:?}");
        assert!(debug.contains("expect(1)"));
        assert!(debug.contains("expect_success()"));
        assert_eq!(expectations.len(), 2);
    }
}
