//! Normalizing heterogeneous inputs into date-time values.
//!
//! A factory accepts an existing value, a Unix timestamp, or a string, and
//! returns a [`MutableDateTime`] or [`ImmutableDateTime`]:
//!
//! - a [`MutableDateTime`] comes back unchanged;
//! - with a format, a string must parse under it *and* render back to exactly
//!   the same string, otherwise the call fails with
//!   [`DateError::InvalidArgument`];
//! - without a format, numbers (and numeric strings) are Unix timestamps and
//!   anything else goes through [`relative::to_timestamp`]; the result is put
//!   in the configured default timezone.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::FactoryConfig;
use crate::error::{DateError, Result};
use crate::format::{self, ParseContext};
use crate::relative;
use crate::value::{ImmutableDateTime, MutableDateTime};
use crate::zone::Zone;

/// Everything a factory accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    Mutable(MutableDateTime),
    Immutable(ImmutableDateTime),
    Text(String),
    Timestamp(i64),
    /// Unix seconds with a fractional part, kept to microseconds.
    Fractional(f64),
}

impl DateInput {
    fn kind(&self) -> &'static str {
        match self {
            DateInput::Mutable(_) => "mutable",
            DateInput::Immutable(_) => "immutable",
            DateInput::Text(_) => "text",
            DateInput::Timestamp(_) => "timestamp",
            DateInput::Fractional(_) => "fractional",
        }
    }
}

impl From<MutableDateTime> for DateInput {
    fn from(value: MutableDateTime) -> Self {
        DateInput::Mutable(value)
    }
}

impl From<ImmutableDateTime> for DateInput {
    fn from(value: ImmutableDateTime) -> Self {
        DateInput::Immutable(value)
    }
}

impl From<String> for DateInput {
    fn from(value: String) -> Self {
        DateInput::Text(value)
    }
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        DateInput::Text(value.to_string())
    }
}

impl From<i64> for DateInput {
    fn from(value: i64) -> Self {
        DateInput::Timestamp(value)
    }
}

impl From<i32> for DateInput {
    fn from(value: i32) -> Self {
        DateInput::Timestamp(value.into())
    }
}

impl From<f64> for DateInput {
    fn from(value: f64) -> Self {
        DateInput::Fractional(value)
    }
}

/// Builds date-time values from [`DateInput`]s.
pub trait DateTimeFactory {
    /// Normalize `from` into a mutable value.
    ///
    /// # Errors
    ///
    /// - [`DateError::InvalidArgument`] if `format` is given and `from` does
    ///   not parse under it, does not render back to itself, or is not text.
    /// - [`DateError::ConstructionFailure`] if a string cannot be resolved or
    ///   a timestamp is out of range.
    fn create_date_time(&self, from: DateInput, format: Option<&str>) -> Result<MutableDateTime>;

    /// Like [`create_date_time`](Self::create_date_time), snapshotted into an
    /// immutable value. An [`ImmutableDateTime`] input is returned unchanged.
    fn create_date_time_immutable(
        &self,
        from: DateInput,
        format: Option<&str>,
    ) -> Result<ImmutableDateTime> {
        match from {
            DateInput::Immutable(value) => Ok(value),
            other => self
                .create_date_time(other, format)
                .map(|value| ImmutableDateTime::from_mutable(&value)),
        }
    }
}

/// The standard factory: a [`FactoryConfig`] plus a source of "now".
#[derive(Debug, Clone)]
pub struct StandardDateTimeFactory<C: Clock = SystemClock> {
    config: FactoryConfig,
    clock: C,
}

impl StandardDateTimeFactory {
    pub fn new(config: FactoryConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for StandardDateTimeFactory {
    fn default() -> Self {
        Self::new(FactoryConfig::global().clone())
    }
}

impl<C: Clock> StandardDateTimeFactory<C> {
    pub fn with_clock(config: FactoryConfig, clock: C) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn default_zone(&self) -> Zone {
        Zone::Named(self.config.timezone)
    }

    fn from_formatted(&self, text: &str, format: &str) -> Result<MutableDateTime> {
        let ctx = ParseContext::new(self.clock.now(), self.default_zone());
        let parsed = format::parse_strict(format, text, &ctx).map_err(|err| {
            debug!(input = text, format, error = %err, "value/format pair rejected");
            DateError::InvalidArgument(format!("Invalid date value/format pair provided: {err}"))
        })?;
        Ok(MutableDateTime::new(parsed.instant, parsed.zone))
    }

    fn instant_from_text(&self, text: &str) -> Result<DateTime<Utc>> {
        match numeric(text) {
            Some(Numeric::Integer(seconds)) => instant_from_seconds(seconds),
            Some(Numeric::Fractional(seconds)) => instant_from_fractional(seconds),
            None => relative::to_timestamp(
                text,
                self.clock.now(),
                &self.default_zone(),
                self.config.week_start,
            ),
        }
    }
}

impl<C: Clock> DateTimeFactory for StandardDateTimeFactory<C> {
    fn create_date_time(&self, from: DateInput, format: Option<&str>) -> Result<MutableDateTime> {
        debug!(kind = from.kind(), format = ?format, "creating date-time");
        let instant = match (from, format) {
            (DateInput::Mutable(value), _) => return Ok(value),
            (DateInput::Immutable(value), _) => return Ok(MutableDateTime::from_immutable(&value)),
            (DateInput::Text(text), Some(format)) => return self.from_formatted(&text, format),
            (_, Some(_)) => {
                return Err(DateError::InvalidArgument(
                    "A format was supplied but the value is not a date string".to_string(),
                ))
            }
            (DateInput::Text(text), None) => self.instant_from_text(&text)?,
            (DateInput::Timestamp(seconds), None) => instant_from_seconds(seconds)?,
            (DateInput::Fractional(seconds), None) => instant_from_fractional(seconds)?,
        };
        Ok(MutableDateTime::new(instant, self.default_zone()))
    }
}

enum Numeric {
    Integer(i64),
    Fractional(f64),
}

/// Numeric strings: optional surrounding blanks, optional sign, digits with
/// an optional fraction and exponent. `"inf"` and `"NaN"` are not numeric.
fn numeric(text: &str) -> Option<Numeric> {
    let trimmed = text.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(Numeric::Integer(n));
    }
    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    let starts_numeric = unsigned
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '.');
    let all_numeric = unsigned
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !starts_numeric || !all_numeric || !unsigned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Numeric::Fractional)
}

fn instant_from_seconds(seconds: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single().ok_or_else(|| {
        DateError::ConstructionFailure(format!("Timestamp {seconds} is out of range"))
    })
}

fn instant_from_fractional(seconds: f64) -> Result<DateTime<Utc>> {
    let out_of_range =
        || DateError::ConstructionFailure(format!("Timestamp {seconds} is out of range"));
    if !seconds.is_finite() || seconds.abs() >= i64::MAX as f64 {
        return Err(out_of_range());
    }
    let whole = seconds.floor();
    let micros = ((seconds - whole) * 1_000_000.0).round() as i64;
    instant_from_seconds(whole as i64)?
        .checked_add_signed(Duration::microseconds(micros))
        .ok_or_else(out_of_range)
}

/// The process-wide factory behind the free functions: the global
/// [`FactoryConfig`] and the system clock.
pub fn default_factory() -> &'static StandardDateTimeFactory {
    static DEFAULT: OnceLock<StandardDateTimeFactory> = OnceLock::new();
    DEFAULT.get_or_init(StandardDateTimeFactory::default)
}

/// [`DateTimeFactory::create_date_time`] on the [`default_factory`].
pub fn create_date_time(
    from: impl Into<DateInput>,
    format: Option<&str>,
) -> Result<MutableDateTime> {
    default_factory().create_date_time(from.into(), format)
}

/// [`DateTimeFactory::create_date_time_immutable`] on the [`default_factory`].
pub fn create_date_time_immutable(
    from: impl Into<DateInput>,
    format: Option<&str>,
) -> Result<ImmutableDateTime> {
    default_factory().create_date_time_immutable(from.into(), format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::value::DateTimeLike;

    fn now() -> DateTime<Utc> {
        // Wednesday, February 18, 2026, 14:30:00 UTC
        Utc.with_ymd_and_hms(2026, 2, 18, 14, 30, 0).unwrap()
    }

    fn factory_in(tz: chrono_tz::Tz) -> StandardDateTimeFactory<FixedClock> {
        StandardDateTimeFactory::with_clock(FactoryConfig::new(tz), FixedClock::new(now()))
    }

    fn factory() -> StandardDateTimeFactory<FixedClock> {
        factory_in(chrono_tz::UTC)
    }

    #[test]
    fn test_mutable_input_is_returned_unchanged() {
        let value = MutableDateTime::from_timestamp(86_400, chrono_tz::Asia::Tokyo).unwrap();
        let created = factory()
            .create_date_time(value.clone().into(), Some("Y"))
            .unwrap();
        assert_eq!(created, value);
    }

    #[test]
    fn test_immutable_input() {
        let value = ImmutableDateTime::from_timestamp(86_400, chrono_tz::Asia::Tokyo).unwrap();
        let mutable = factory().create_date_time(value.into(), None).unwrap();
        assert_eq!(mutable.timestamp(), 86_400);
        assert_eq!(mutable.timezone(), value.timezone());
        let same = factory()
            .create_date_time_immutable(value.into(), None)
            .unwrap();
        assert_eq!(same, value);
    }

    #[test]
    fn test_integer_timestamp_uses_default_zone() {
        let created = factory_in(chrono_tz::Europe::Paris)
            .create_date_time(1_700_000_000_i64.into(), None)
            .unwrap();
        assert_eq!(created.timestamp(), 1_700_000_000);
        assert_eq!(created.timezone(), Zone::Named(chrono_tz::Europe::Paris));
    }

    #[test]
    fn test_numeric_strings_are_timestamps() {
        let created = factory().create_date_time("1700000000".into(), None).unwrap();
        assert_eq!(created.timestamp(), 1_700_000_000);
        let created = factory().create_date_time(" 1.5 ".into(), None).unwrap();
        assert_eq!((created.timestamp(), created.microsecond()), (1, 500_000));
        let created = factory().create_date_time("-1.25".into(), None).unwrap();
        assert_eq!((created.timestamp(), created.microsecond()), (-2, 750_000));
    }

    #[test]
    fn test_fractional_timestamp() {
        let created = factory().create_date_time(1_700_000_000.25_f64.into(), None).unwrap();
        assert_eq!(created.format("U.u"), "1700000000.250000");
    }

    #[test]
    fn test_free_form_string_is_resolved_and_rezoned() {
        let created = factory_in(chrono_tz::America::New_York)
            .create_date_time("2026-03-15T14:00:00Z".into(), None)
            .unwrap();
        assert_eq!(created.format("Y-m-d H:i T"), "2026-03-15 10:00 EDT");

        let created = factory().create_date_time("tomorrow noon".into(), None).unwrap();
        assert_eq!(created.format("Y-m-d H:i:s"), "2026-02-19 12:00:00");
    }

    #[test]
    fn test_free_form_string_in_default_zone() {
        let created = factory_in(chrono_tz::America::New_York)
            .create_date_time("2026-01-15 09:30".into(), None)
            .unwrap();
        assert_eq!(created.timestamp(), 1_768_487_400);
    }

    #[test]
    fn test_unresolvable_string() {
        let err = factory()
            .create_date_time("not a date".into(), None)
            .unwrap_err();
        assert!(matches!(err, DateError::ConstructionFailure(_)));
    }

    #[test]
    fn test_formatted_round_trip() {
        let created = factory()
            .create_date_time("2023-01-05 10:20:30".into(), Some("Y-m-d H:i:s"))
            .unwrap();
        assert_eq!(created.format("Y-m-d H:i:s"), "2023-01-05 10:20:30");
    }

    #[test]
    fn test_formatted_keeps_parsed_zone() {
        let created = factory_in(chrono_tz::Europe::Paris)
            .create_date_time("2023-07-01 09:00 +0530".into(), Some("Y-m-d H:i O"))
            .unwrap();
        assert_eq!(created.format("P"), "+05:30");
    }

    #[test]
    fn test_formatted_mismatch_is_invalid_argument() {
        let err = factory().create_date_time("99".into(), Some("Y")).unwrap_err();
        assert_eq!(
            err,
            DateError::InvalidArgument(
                "Invalid date value/format pair provided: '99' reads back as '0099'".to_string()
            )
        );
        for (value, format) in [("2023-13-05", "Y-m-d"), ("2023/01/05", "Y-m-d"), ("", "Y")] {
            assert!(matches!(
                factory().create_date_time(value.into(), Some(format)),
                Err(DateError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_format_with_non_text_input() {
        assert!(matches!(
            factory().create_date_time(1_700_000_000_i64.into(), Some("U")),
            Err(DateError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_out_of_range_timestamps() {
        for input in [DateInput::Timestamp(i64::MAX), DateInput::Fractional(1e300)] {
            assert!(matches!(
                factory().create_date_time(input, None),
                Err(DateError::ConstructionFailure(_))
            ));
        }
    }

    #[test]
    fn test_immutable_snapshot_survives_mutation() {
        let mut mutable = factory().create_date_time(0_i64.into(), None).unwrap();
        let snapshot = factory()
            .create_date_time_immutable(mutable.clone().into(), None)
            .unwrap();
        mutable.modify("+1 year").unwrap();
        assert_eq!(snapshot.timestamp(), 0);
        assert_eq!(mutable.format("Y"), "1971");
    }

    #[test]
    fn test_numeric_detection() {
        assert!(matches!(numeric("42"), Some(Numeric::Integer(42))));
        assert!(matches!(numeric("1e3"), Some(Numeric::Fractional(n)) if n == 1000.0));
        assert!(matches!(numeric(".5"), Some(Numeric::Fractional(n)) if n == 0.5));
        for text in ["inf", "NaN", "-", ".", "1 2", "12abc", "+1 day", "2023-01-05"] {
            assert!(numeric(text).is_none(), "{text:?}");
        }
    }
}
