//! A hot, multicast publisher.

use std::fmt;
use std::sync::Arc;

use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;

use super::{Completion, Publisher, Subscription};

/// A publisher driven by hand.
///
/// Every signal is delivered to each subscription open at the time it is
/// sent and buffered until consumed. A subscription opened after
/// termination receives only the terminal signal. Clones share state, so a
/// clone can be moved to another thread or task to drive the subject there.
///
/// # Example
///
/// ```rust
/// use streamcheck::publisher::{Publisher, Subject};
///
/// let subject = Subject::<&str, ()>::new();
/// let _early = subject.subscribe();
/// subject.send("cool");
/// assert_eq!(subject.subscriber_count(), 1);
/// ```
pub struct Subject<T, E> {
    inner: Arc<Mutex<SubjectState<T, E>>>,
}

struct SubjectState<T, E> {
    subscribers: Vec<UnboundedSender<Result<T, E>>>,
    completion: Option<Completion<E>>,
}

impl<T, E> Subject<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Create a subject with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SubjectState {
                subscribers: Vec::new(),
                completion: None,
            })),
        }
    }

    /// Deliver a value to every live subscriber.
    ///
    /// Ignored once the subject has terminated.
    pub fn send(&self, value: T) {
        let mut state = self.inner.lock();
        if state.completion.is_some() {
            return;
        }
        state
            .subscribers
            .retain(|subscriber| subscriber.unbounded_send(Ok(value.clone())).is_ok());
    }

    /// Terminate successfully.
    pub fn finish(&self) {
        self.terminate(Completion::Finished);
    }

    /// Terminate with `error`.
    pub fn fail(&self, error: E) {
        self.terminate(Completion::Failed(error));
    }

    /// Number of subscriptions that are still open.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut state = self.inner.lock();
        state.subscribers.retain(|subscriber| !subscriber.is_closed());
        state.subscribers.len()
    }

    /// `true` once [`finish`](Self::finish) or [`fail`](Self::fail) was called.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.inner.lock().completion.is_some()
    }

    fn terminate(&self, completion: Completion<E>) {
        let mut state = self.inner.lock();
        if state.completion.is_some() {
            return;
        }
        // Dropping the senders ends each subscription after its buffered items.
        for subscriber in state.subscribers.drain(..) {
            if let Completion::Failed(error) = &completion {
                let _ = subscriber.unbounded_send(Err(error.clone()));
            }
        }
        state.completion = Some(completion);
    }
}

impl<T, E> Publisher for Subject<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    type Output = T;
    type Failure = E;

    fn subscribe(&self) -> Subscription<T, E> {
        let mut state = self.inner.lock();
        match &state.completion {
            Some(Completion::Finished) => stream::empty().boxed(),
            Some(Completion::Failed(error)) => stream::once(futures::future::ready(Err(error.clone()))).boxed(),
            None => {
                let (tx, rx) = unbounded();
                state.subscribers.push(tx);
                rx.boxed()
            }
        }
    }
}

impl<T, E> Default for Subject<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Clone for Subject<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> fmt::Debug for Subject<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("Subject")
            .field("subscribers", &state.subscribers.len())
            .field("terminated", &state.completion.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_values_reach_every_subscriber() {
        let subject = Subject::<i32, ()>::new();
        let mut first = subject.subscribe();
        let mut second = subject.subscribe();

        subject.send(1);
        subject.send(2);
        subject.finish();

        assert_eq!(first.by_ref().collect::<Vec<_>>().await, vec![Ok(1), Ok(2)]);
        assert_eq!(second.next().await, Some(Ok(1)));
        assert_eq!(second.next().await, Some(Ok(2)));
        assert_eq!(second.next().await, None);
    }

    #[tokio::test]
    async fn test_failure_is_delivered_last() {
        let subject = Subject::<i32, &str>::new();
        let mut subscription = subject.subscribe();

        subject.send(7);
        subject.fail("boom");
        subject.send(8);

        assert_eq!(subscription.next().await, Some(Ok(7)));
        assert_eq!(subscription.next().await, Some(Err("boom")));
        assert_eq!(subscription.next().await, None);
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_terminal_signal() {
        let finished = Subject::<i32, &str>::new();
        finished.finish();
        assert_eq!(finished.subscribe().next().await, None);

        let failed = Subject::<i32, &str>::new();
        failed.fail("late");
        assert_eq!(failed.subscribe().next().await, Some(Err("late")));
    }

    #[test]
    fn test_dropped_subscription_is_pruned() {
        let subject = Subject::<i32, ()>::new();
        let subscription = subject.subscribe();
        assert_eq!(subject.subscriber_count(), 1);

        drop(subscription);
        assert_eq!(subject.subscriber_count(), 0);
        assert!(!subject.is_terminated());
    }
}
