//! # dateforge
//!
//! Date-time construction and strict format validation.
//!
//! A factory normalizes whatever a caller has (an existing value, a Unix
//! timestamp, a date string, a string plus its expected format) into a
//! mutable or immutable date-time in a configured timezone. A validator answers
//! whether a string matches a format exactly: it must parse under the format
//! and render back to the identical string.
//!
//! ## Modules
//!
//! - [`factory`] — `DateTimeFactory` trait, `StandardDateTimeFactory`, `DateInput`
//! - [`validator`] — `DateFormatValidator` trait, `DateValidator`
//! - [`creation`] — free-function and trait forms of the factory operations
//! - [`value`] — `MutableDateTime`, `ImmutableDateTime`, `DateTimeLike`
//! - [`format`] — token format strings: rendering, lenient parsing, round-trip check
//! - [`relative`] — date strings and relative expressions → instant
//! - [`zone`] — IANA zones, fixed offsets and abbreviations
//! - [`clock`] — injectable sources of "now"
//! - [`config`] — default timezone and week start
//! - [`error`] — Error types
//!
//! ```
//! use dateforge::{DateFormatValidator, DateTimeFactory, DateTimeLike, DateValidator};
//! use dateforge::{FactoryConfig, StandardDateTimeFactory};
//!
//! let factory = StandardDateTimeFactory::new(FactoryConfig::new(chrono_tz::Europe::Paris));
//! let value = factory.create_date_time(1_700_000_000_i64.into(), None).unwrap();
//! assert_eq!(value.format("Y-m-d H:i T"), "2023-11-14 23:13 CET");
//!
//! let validator = DateValidator::new(&FactoryConfig::default());
//! assert!(validator.valid_in_format("2023-01-05", "Y-m-d"));
//! assert!(!validator.valid_in_format("2023-13-05", "Y-m-d"));
//! ```

mod calendar;
mod names;

pub mod clock;
pub mod config;
pub mod creation;
pub mod error;
pub mod factory;
pub mod format;
pub mod relative;
pub mod validator;
pub mod value;
pub mod zone;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{FactoryConfig, WeekStartDay};
pub use creation::{to_date_time, to_date_time_immutable, DateTimeCreation};
pub use error::{DateError, Result};
pub use factory::{
    create_date_time, create_date_time_immutable, default_factory, DateInput, DateTimeFactory,
    StandardDateTimeFactory,
};
pub use format::{parse_strict, render, FormatError, ParseContext, Parsed};
pub use validator::{DateFormatValidator, DateValidator};
pub use value::{DateTimeLike, ImmutableDateTime, MutableDateTime};
pub use zone::Zone;
