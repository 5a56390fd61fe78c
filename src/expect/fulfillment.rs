//! Thread-safe fulfillment counters.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;

/// Counts occurrences of an event against a threshold.
///
/// A normal counter is satisfied once it has been fulfilled `expected`
/// times. An inverted counter reaching its threshold is a violation: it
/// records something that must not happen. Counters only ever go up.
///
/// # Example
///
/// ```rust
/// use streamcheck::expect::Fulfillment;
///
/// let counter = Fulfillment::new(2);
/// assert!(!counter.fulfill());
/// assert!(counter.fulfill());
/// assert!(!counter.fulfill());
/// assert!(counter.is_fulfilled());
/// assert_eq!(counter.count(), 3);
/// ```
#[derive(Debug)]
pub struct Fulfillment {
    expected: usize,
    inverted: bool,
    state: Mutex<FulfillmentState>,
}

#[derive(Debug, Default)]
struct FulfillmentState {
    actual: usize,
    wakers: Vec<Waker>,
}

impl Fulfillment {
    /// A counter satisfied after `expected` fulfillments.
    #[must_use]
    pub fn new(expected: usize) -> Self {
        Self::build(expected, false)
    }

    /// A counter whose threshold marks a violation.
    #[must_use]
    pub fn inverted(expected: usize) -> Self {
        Self::build(expected, true)
    }

    fn build(expected: usize, inverted: bool) -> Self {
        Self {
            expected,
            inverted,
            state: Mutex::new(FulfillmentState::default()),
        }
    }

    /// Record one occurrence.
    ///
    /// Returns `true` only for the increment that first reaches the
    /// threshold.
    pub fn fulfill(&self) -> bool {
        let wakers = {
            let mut state = self.state.lock();
            state.actual += 1;
            if state.actual != self.expected {
                return false;
            }
            std::mem::take(&mut state.wakers)
        };
        for waker in wakers {
            waker.wake();
        }
        true
    }

    /// `true` once the count has reached the threshold.
    #[must_use]
    pub fn is_fulfilled(&self) -> bool {
        self.state.lock().actual >= self.expected
    }

    /// Occurrences recorded so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.state.lock().actual
    }

    /// The threshold.
    #[must_use]
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// `true` for counters built with [`Fulfillment::inverted`].
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// A future that resolves once the threshold is reached.
    ///
    /// Resolves immediately for a threshold of zero.
    pub fn fulfilled(self: &Arc<Self>) -> Fulfilled {
        Fulfilled {
            counter: Arc::clone(self),
        }
    }
}

/// Future returned by [`Fulfillment::fulfilled`].
#[must_use = "futures do nothing unless polled"]
#[derive(Debug)]
pub struct Fulfilled {
    counter: Arc<Fulfillment>,
}

impl Future for Fulfilled {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.counter.state.lock();
        if state.actual >= self.counter.expected {
            return Poll::Ready(());
        }
        if !state.wakers.iter().any(|waker| waker.will_wake(cx.waker())) {
            state.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}
