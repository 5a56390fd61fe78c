//! Bridging a publisher to a single awaited value.
//!
//! [`first_value`] subscribes to a publisher and resolves with its first
//! value, its failure, or [`FirstValueError::FinishedWithoutValue`].
//!
//! # Example
//!
//! ```rust
//! use streamcheck::future::{first_value, FirstValueError};
//! use streamcheck::publisher::{empty, sequence};
//!
//! # futures::executor::block_on(async {
//! assert_eq!(first_value(&sequence(vec![3, 4])).await, Ok(3));
//! assert_eq!(
//!     first_value(&empty::<i32>()).await,
//!     Err(FirstValueError::FinishedWithoutValue)
//! );
//! # });
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use pin_project_lite::pin_project;
use thiserror::Error;

use crate::publisher::{Publisher, Subscription};

/// Why [`FirstValue`] resolved without a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FirstValueError<E> {
    /// The publisher finished before emitting anything.
    #[error("publisher finished without emitting a value")]
    FinishedWithoutValue,

    /// The publisher failed before emitting anything.
    #[error("publisher failed before emitting a value")]
    Failed(E),
}

/// Await the first value of `publisher`.
///
/// Opens one subscription. It is dropped as soon as the returned future
/// resolves, so the publisher sees the cancellation right away.
pub fn first_value<P: Publisher>(publisher: &P) -> FirstValue<P::Output, P::Failure> {
    FirstValue {
        subscription: Some(publisher.subscribe()),
    }
}

pin_project! {
    /// Future returned by [`first_value`].
    #[must_use = "futures do nothing unless polled"]
    pub struct FirstValue<T, E> {
        subscription: Option<Subscription<T, E>>,
    }
}

impl<T, E> Future for FirstValue<T, E> {
    type Output = Result<T, FirstValueError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let subscription = this
            .subscription
            .as_mut()
            .expect("FirstValue polled after completion");

        let outcome = match subscription.as_mut().poll_next(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Some(Ok(value))) => Ok(value),
            Poll::Ready(Some(Err(error))) => Err(FirstValueError::Failed(error)),
            Poll::Ready(None) => Err(FirstValueError::FinishedWithoutValue),
        };
        // Cancel the subscription before handing out the result.
        *this.subscription = None;
        Poll::Ready(outcome)
    }
}
