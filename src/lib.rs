//! # streamcheck
//!
//! > Expectations for async publishers
//!
//! **streamcheck** asserts on streams of values that end in success or
//! failure. Declare what a publisher should emit, then wait for it under a
//! deadline. Mismatches come back as structural diffs that point at the
//! exact member that differs and at the line that declared the expectation.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use streamcheck::prelude::*;
//!
//! #[derive(Clone, Inspect)]
//! struct Reading {
//!     sensor: &'static str,
//!     celsius: i32,
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let feed = Subject::<Reading, String>::new();
//! let expectations = testable(&feed)
//!     .expect(Reading { sensor: "attic", celsius: 21 })
//!     .expect_success();
//!
//! feed.send(Reading { sensor: "attic", celsius: 21 });
//! feed.finish();
//!
//! expectations.wait(Duration::from_secs(1)).await.unwrap();
//! # }
//! ```
//!
//! ## Features
//!
//! - **Structural comparison** - path-qualified diffs over any [`Inspect`] value
//! - **Expectations** - value, count, completion and outcome assertions
//! - **Order checks** - optionally require declaration order
//! - **Deadlines** - race any future against a timeout
//! - **First value** - turn a publisher into a single awaited value

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Lets derived impls name `::streamcheck` from inside this crate.
extern crate self as streamcheck;

pub mod compare;
pub mod error;
pub mod expect;
pub mod future;
pub mod publisher;
pub mod time;

/// Prelude for convenient imports
///
/// ```rust
/// use streamcheck::prelude::*;
/// ```
pub mod prelude {
    pub use crate::compare::{compare, equals, Comparison, Inspect};
    pub use crate::error::{Error, Result};
    pub use crate::expect::{testable, Expectations, FailureKind, Recorder, WaitOptions};
    pub use crate::future::first_value;
    pub use crate::publisher::{just, never, sequence, Publisher, Subject};
    pub use crate::time::with_timeout;

    #[cfg(feature = "derive")]
    pub use streamcheck_macros::Inspect;
}

// Re-exports
pub use compare::Inspect;
pub use error::{Error, Result};
pub use expect::{testable, Expectations};
pub use future::first_value;
pub use time::with_timeout;

// Re-export the derive macro when the derive feature is enabled
#[cfg(feature = "derive")]
pub use streamcheck_macros::Inspect;
