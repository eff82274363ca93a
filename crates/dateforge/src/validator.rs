//! Strict date format validation.
//!
//! A string is valid in a format when it parses under that format and the
//! parsed value renders back to the identical string. Lenient parsing alone
//! would accept `2023-13-05` as `Y-m-d` (it overflows into January 2024);
//! the round trip rejects it.

use tracing::trace;

use crate::clock::{Clock, SystemClock};
use crate::config::FactoryConfig;
use crate::format::{self, ParseContext};
use crate::zone::Zone;

/// Answers whether a string matches a date format exactly.
pub trait DateFormatValidator {
    /// `true` only if `date` parses under `format` and renders back to
    /// exactly `date`. Never fails: unknown tokens, unsatisfiable formats and
    /// trailing data all yield `false`.
    fn valid_in_format(&self, date: &str, format: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct DateValidator<C: Clock = SystemClock> {
    zone: Zone,
    clock: C,
}

impl DateValidator {
    pub fn new(config: &FactoryConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for DateValidator {
    fn default() -> Self {
        Self::new(FactoryConfig::global())
    }
}

impl<C: Clock> DateValidator<C> {
    /// Fields absent from a format are filled from `clock`, in the config's
    /// timezone.
    pub fn with_clock(config: &FactoryConfig, clock: C) -> Self {
        Self {
            zone: Zone::Named(config.timezone),
            clock,
        }
    }
}

impl<C: Clock> DateFormatValidator for DateValidator<C> {
    fn valid_in_format(&self, date: &str, format: &str) -> bool {
        let ctx = ParseContext::new(self.clock.now(), self.zone);
        match format::parse_strict(format, date, &ctx) {
            Ok(_) => true,
            Err(err) => {
                trace!(date, format, error = %err, "date rejected");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{TimeZone, Utc};

    fn validator() -> DateValidator<FixedClock> {
        let now = Utc.with_ymd_and_hms(2026, 2, 18, 14, 30, 0).unwrap();
        DateValidator::with_clock(&FactoryConfig::default(), FixedClock::new(now))
    }

    #[test]
    fn test_valid_dates() {
        let v = validator();
        assert!(v.valid_in_format("2023-01-05", "Y-m-d"));
        assert!(v.valid_in_format("05/01/2023", "d/m/Y"));
        assert!(v.valid_in_format("Thursday 5th January 2023", "l jS F Y"));
        assert!(v.valid_in_format("2023-01-05T10:20:30+01:00", "Y-m-d\\TH:i:sP"));
        assert!(v.valid_in_format("2:07 PM", "g:i A"));
        assert!(v.valid_in_format("1700000000", "U"));
    }

    #[test]
    fn test_overflow_is_invalid() {
        let v = validator();
        assert!(!v.valid_in_format("2023-13-05", "Y-m-d"));
        assert!(!v.valid_in_format("2023-02-30", "Y-m-d"));
        assert!(!v.valid_in_format("25:00", "H:i"));
    }

    #[test]
    fn test_wrong_layout_is_invalid() {
        let v = validator();
        assert!(!v.valid_in_format("05/01/2023", "Y-m-d"));
        assert!(!v.valid_in_format("2023-1-5", "Y-m-d"));
        assert!(!v.valid_in_format("2023-01-05 ", "Y-m-d"));
        assert!(!v.valid_in_format("99", "Y"));
        assert!(!v.valid_in_format("jan", "M"));
    }

    #[test]
    fn test_wrong_day_name_is_invalid() {
        assert!(!validator().valid_in_format("Fri 2023-01-05", "D Y-m-d"));
    }

    #[test]
    fn test_garbage_never_panics() {
        let v = validator();
        assert!(!v.valid_in_format("anything", "not-a-real-format-token-sequence"));
        assert!(!v.valid_in_format("", "Y-m-d"));
        assert!(!v.valid_in_format("2023", ""));
        assert!(!v.valid_in_format("\u{1F600}", "d"));
    }

    #[test]
    fn test_empty_matches_empty() {
        assert!(validator().valid_in_format("", ""));
    }
}
