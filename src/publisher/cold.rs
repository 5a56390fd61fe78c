//! Cold publishers: every subscription replays the same signals.

use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;

use futures::stream::{self, Stream, StreamExt};

use super::{Publisher, Subscription};

/// Emits a fixed list of values, then finishes or fails.
///
/// # Example
///
/// ```rust
/// use streamcheck::publisher::{sequence, Publisher};
/// use futures::StreamExt;
///
/// # futures::executor::block_on(async {
/// let publisher = sequence(vec![1, 2]).failing_with("boom");
/// let signals: Vec<_> = publisher.subscribe().collect().await;
/// assert_eq!(signals, vec![Ok(1), Ok(2), Err("boom")]);
/// # });
/// ```
#[derive(Clone, Debug)]
pub struct Sequence<T, E = Infallible> {
    values: Vec<T>,
    failure: Option<E>,
}

impl<T, E> Sequence<T, E> {
    /// A sequence with an explicit failure type that finishes successfully.
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = T>) -> Self {
        Self {
            values: values.into_iter().collect(),
            failure: None,
        }
    }

    /// Terminate with `error` instead of finishing.
    #[must_use]
    pub fn failing_with<F>(self, error: F) -> Sequence<T, F> {
        Sequence {
            values: self.values,
            failure: Some(error),
        }
    }
}

impl<T, E> Publisher for Sequence<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    type Output = T;
    type Failure = E;

    fn subscribe(&self) -> Subscription<T, E> {
        let values = stream::iter(self.values.clone().into_iter().map(Ok));
        let failure = stream::iter(self.failure.clone().map(Err));
        values.chain(failure).boxed()
    }
}

/// Emit `values` in order, then finish.
#[must_use]
pub fn sequence<T>(values: impl IntoIterator<Item = T>) -> Sequence<T> {
    Sequence::new(values)
}

/// Emit one value, then finish.
#[must_use]
pub fn just<T>(value: T) -> Sequence<T> {
    Sequence::new([value])
}

/// Finish without emitting.
#[must_use]
pub fn empty<T>() -> Sequence<T> {
    Sequence::new([])
}

/// Never emits and never terminates.
pub struct Never<T, E = Infallible> {
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<T, E> Never<T, E> {
    /// A silent publisher with explicit value and failure types.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T, E> Default for Never<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Clone for Never<T, E> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for Never<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Never")
    }
}

impl<T, E> Publisher for Never<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Failure = E;

    fn subscribe(&self) -> Subscription<T, E> {
        stream::pending().boxed()
    }
}

/// A publisher that never emits and never terminates.
#[must_use]
pub fn never<T>() -> Never<T> {
    Never::new()
}

/// Publisher backed by a stream factory.
///
/// # Example
///
/// ```rust
/// use streamcheck::publisher::{from_fn, Publisher};
/// use futures::{stream, StreamExt};
///
/// # futures::executor::block_on(async {
/// let publisher = from_fn(|| stream::iter(vec![Ok::<_, ()>(1), Ok(2)]));
/// assert_eq!(publisher.subscribe().count().await, 2);
/// assert_eq!(publisher.subscribe().count().await, 2);
/// # });
/// ```
#[derive(Clone)]
pub struct FromFn<F> {
    factory: F,
}

impl<F> fmt::Debug for FromFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromFn").finish_non_exhaustive()
    }
}

impl<F, S, T, E> Publisher for FromFn<F>
where
    F: Fn() -> S,
    S: Stream<Item = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Failure = E;

    fn subscribe(&self) -> Subscription<T, E> {
        (self.factory)().boxed()
    }
}

/// Build a publisher that calls `factory` once per subscription.
pub fn from_fn<F, S>(factory: F) -> FromFn<F>
where
    F: Fn() -> S,
    S: Stream,
{
    FromFn { factory }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_sequence_replays_per_subscription() {
        let publisher = sequence(vec!["cool", "neat"]);
        let first: Vec<_> = publisher.subscribe().collect().await;
        let second: Vec<_> = publisher.subscribe().collect().await;
        assert_eq!(first, vec![Ok("cool"), Ok("neat")]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_and_just() {
        assert_eq!(empty::<i32>().subscribe().count().await, 0);
        assert_eq!(just(5).subscribe().collect::<Vec<_>>().await, vec![Ok(5)]);
    }

    #[tokio::test]
    async fn test_explicit_failure_type() {
        let publisher = Sequence::<i32, String>::new([1]);
        let signals: Vec<_> = publisher.subscribe().collect().await;
        assert_eq!(signals, vec![Ok(1)]);
    }

    #[tokio::test]
    async fn test_never_stays_pending() {
        let mut subscription = never::<i32>().subscribe();
        let polled = futures::poll!(subscription.next());
        assert!(polled.is_pending());
    }

    #[tokio::test]
    async fn test_from_fn_calls_factory_per_subscription() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let publisher = from_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            stream::iter(vec![Ok::<_, ()>(1)])
        });

        let _first = publisher.subscribe();
        let _second = publisher.subscribe();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
