//! Errors returned to the presentation layer.
//!
//! Every failure is recoverable at the level of a single user action:
//! validation failures are caught before anything is touched, store failures
//! come back from the [`RemoteStore`](crate::api::RemoteStore).

use chrono::NaiveDate;
use thiserror::Error;

use crate::api::StoreError;

/// A local invariant that user input would break.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("End date {end} is before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("A trip can have at most {max} tags")]
    TooManyTags { max: usize },

    #[error("A tag named '{0}' already exists")]
    DuplicateTagName(String),

    #[error("Tag name cannot be empty")]
    EmptyTagName,

    #[error("Unknown tag: {0}")]
    UnknownTag(String),

    #[error("At most {max} images can be attached to an entry (got {count})")]
    TooManyImages { count: usize, max: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TripError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
}

impl TripError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TripError::Store(StoreError::NotFound(_)))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, TripError::Store(StoreError::Unavailable(_)))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, TripError::Validation(_))
    }

    /// Short message suitable for a status line or alert
    pub fn user_message(&self) -> String {
        match self {
            TripError::Store(StoreError::NotFound(_)) => {
                "This item no longer exists. The view has been refreshed.".to_string()
            }
            TripError::Store(StoreError::Unavailable(_)) => {
                "Could not reach the server. Please try again.".to_string()
            }
            TripError::Validation(e) => e.to_string(),
        }
    }
}
