//! Error types for dateforge operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// The value/format pair does not round-trip, or the value could not be
    /// parsed under the supplied format.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The date layer could not build a value from the given input.
    #[error("Construction failure: {0}")]
    ConstructionFailure(String),

    /// A timezone name the bundled tz database does not know.
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

pub type Result<T> = std::result::Result<T, DateError>;
