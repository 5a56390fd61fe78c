//! The stream abstraction expectations attach to.
//!
//! A [`Publisher`] hands out independent [`Subscription`]s. Each
//! subscription is a stream of `Result<T, E>`: `Ok` items are values, an
//! `Err` item is the failure terminal signal, and the end of the stream is
//! the success terminal signal.
//!
//! Two families of publishers are provided for tests:
//!
//! - [`Subject`] - a hot, multicast publisher driven by hand
//! - [`just`], [`sequence`], [`empty`], [`never`], [`from_fn`] - cold
//!   publishers that replay the same signals to every subscriber
//!
//! # Example
//!
//! ```rust
//! use streamcheck::publisher::{Publisher, Subject};
//! use futures::StreamExt;
//!
//! # futures::executor::block_on(async {
//! let subject = Subject::<i32, String>::new();
//! let mut subscription = subject.subscribe();
//!
//! subject.send(1);
//! subject.finish();
//!
//! assert_eq!(subscription.next().await, Some(Ok(1)));
//! assert_eq!(subscription.next().await, None);
//! # });
//! ```

mod cold;
mod subject;

use futures::stream::BoxStream;

pub use cold::{empty, from_fn, just, never, sequence, FromFn, Never, Sequence};
pub use subject::Subject;

/// One subscription to a publisher.
pub type Subscription<T, E> = BoxStream<'static, Result<T, E>>;

/// A source of values that supports any number of independent subscribers.
pub trait Publisher {
    /// Value type.
    type Output: Send + 'static;
    /// Error carried by the failure terminal signal.
    type Failure: Send + 'static;

    /// Open a new subscription. Dropping it cancels the subscription.
    fn subscribe(&self) -> Subscription<Self::Output, Self::Failure>;
}

impl<P: Publisher + ?Sized> Publisher for &P {
    type Output = P::Output;
    type Failure = P::Failure;

    fn subscribe(&self) -> Subscription<Self::Output, Self::Failure> {
        (**self).subscribe()
    }
}

/// How a publisher terminated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion<E> {
    /// Terminated without error.
    Finished,
    /// Terminated with an error.
    Failed(E),
}

impl<E> Completion<E> {
    /// `true` for [`Completion::Finished`].
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// The carried error, if the publisher failed.
    #[must_use]
    pub fn failure(&self) -> Option<&E> {
        match self {
            Self::Finished => None,
            Self::Failed(error) => Some(error),
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Finished => "finished",
            Self::Failed(_) => "failed",
        }
    }
}
