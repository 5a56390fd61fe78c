//! Error definitions
//!
//! This module provides the crate-wide error type for streamcheck.

use std::time::Duration;

use thiserror::Error;

use crate::expect::Failures;

/// Main error type for streamcheck
#[derive(Error, Debug)]
pub enum Error {
    /// The operation did not finish before its deadline.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// A zero duration was given where a positive one is required.
    #[error("Invalid timeout {0:?}: the duration must be greater than zero")]
    InvalidTimeout(Duration),

    /// One or more expectations were not met.
    #[error("{0}")]
    Expectations(#[from] Failures),
}

impl Error {
    /// The expectation failures, if this is [`Error::Expectations`].
    #[must_use]
    pub fn failures(&self) -> Option<&Failures> {
        match self {
            Self::Expectations(failures) => Some(failures),
            _ => None,
        }
    }

    /// `true` for [`Error::Timeout`].
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
