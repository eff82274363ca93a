//! Date-time values: a microsecond-precision instant plus the [`Zone`] it is
//! viewed in.
//!
//! [`MutableDateTime`] changes in place through `&mut self` setters that
//! return `&mut Self` for chaining. [`ImmutableDateTime`] is a `Copy` value
//! whose transforms return a new value. Both read through [`DateTimeLike`].

use std::fmt;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDateTime, TimeZone, Timelike, Utc};

use crate::calendar::{overflowing_date, overflowing_datetime};
use crate::config::WeekStartDay;
use crate::error::{DateError, Result};
use crate::format;
use crate::relative;
use crate::zone::Zone;

/// Read access shared by both flavors.
pub trait DateTimeLike {
    /// The instant in UTC.
    fn utc(&self) -> DateTime<Utc>;

    /// The zone the instant is viewed in.
    fn timezone(&self) -> Zone;

    /// Seconds since the Unix epoch.
    fn timestamp(&self) -> i64 {
        self.utc().timestamp()
    }

    /// Sub-second part in microseconds.
    fn microsecond(&self) -> u32 {
        self.utc().nanosecond() % 1_000_000_000 / 1000
    }

    /// Wall-clock time in [`timezone`](Self::timezone).
    fn local(&self) -> DateTime<FixedOffset> {
        self.timezone().localize(&self.utc())
    }

    /// Render with a token format string (see [`crate::format`]).
    fn format(&self, format: &str) -> String {
        format::render(&self.utc(), &self.timezone(), format)
    }
}

/// Instant + zone with the arithmetic both flavors share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Moment {
    utc: DateTime<Utc>,
    zone: Zone,
}

impl Moment {
    fn from_timestamp(timestamp: i64, zone: Zone) -> Result<Self> {
        let utc = Utc.timestamp_opt(timestamp, 0).single().ok_or_else(|| {
            DateError::ConstructionFailure(format!("Timestamp {timestamp} is out of range"))
        })?;
        Ok(Self { utc, zone })
    }

    fn resolve(&self, local: Option<NaiveDateTime>, what: &str) -> Result<Self> {
        let utc = local
            .and_then(|l| self.zone.resolve_local(&l))
            .ok_or_else(|| DateError::ConstructionFailure(format!("{what} is out of range")))?;
        Ok(Self { utc, zone: self.zone })
    }

    /// Out-of-range components overflow: month 13 is January of the next year.
    fn with_date(&self, year: i64, month: i64, day: i64) -> Result<Self> {
        let local = self.zone.localize(&self.utc).naive_local();
        let date = overflowing_date(year, month, day).map(|d| d.and_time(local.time()));
        self.resolve(date, "Date")
    }

    /// Out-of-range components overflow: hour 25 is 01:00 the next day.
    fn with_time(&self, hour: i64, minute: i64, second: i64, microsecond: i64) -> Result<Self> {
        let date = self.zone.localize(&self.utc).date_naive();
        let local = overflowing_datetime(
            date.year() as i64,
            date.month() as i64,
            date.day() as i64,
            hour,
            minute,
            second,
            microsecond,
        );
        self.resolve(local, "Time")
    }

    fn shifted(&self, delta: Duration) -> Result<Self> {
        let utc = self.utc.checked_add_signed(delta).ok_or_else(|| {
            DateError::ConstructionFailure(format!("Adding {delta} overflows the date range"))
        })?;
        Ok(Self { utc, zone: self.zone })
    }

    fn modified(&self, expression: &str) -> Result<Self> {
        let utc = relative::to_timestamp(expression, self.utc, &self.zone, WeekStartDay::default())?;
        Ok(Self { utc, zone: self.zone })
    }
}

fn negate(delta: Duration) -> Result<Duration> {
    Duration::zero()
        .checked_sub(&delta)
        .ok_or_else(|| DateError::ConstructionFailure(format!("Cannot negate {delta}")))
}

// ── MutableDateTime ─────────────────────────────────────────────────────────

/// A date-time that changes in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutableDateTime {
    inner: Moment,
}

impl MutableDateTime {
    pub fn new(utc: DateTime<Utc>, zone: impl Into<Zone>) -> Self {
        Self {
            inner: Moment { utc, zone: zone.into() },
        }
    }

    /// # Errors
    ///
    /// [`DateError::ConstructionFailure`] if the timestamp is out of range.
    pub fn from_timestamp(timestamp: i64, zone: impl Into<Zone>) -> Result<Self> {
        Ok(Self {
            inner: Moment::from_timestamp(timestamp, zone.into())?,
        })
    }

    pub fn from_immutable(value: &ImmutableDateTime) -> Self {
        Self { inner: value.inner }
    }

    /// View the same instant from another zone.
    pub fn set_timezone(&mut self, zone: impl Into<Zone>) -> &mut Self {
        self.inner.zone = zone.into();
        self
    }

    /// Move to `timestamp` seconds since the epoch, dropping sub-seconds.
    pub fn set_timestamp(&mut self, timestamp: i64) -> Result<&mut Self> {
        self.inner = Moment::from_timestamp(timestamp, self.inner.zone)?;
        Ok(self)
    }

    /// Change the local date, keeping the local time of day.
    pub fn set_date(&mut self, year: i64, month: i64, day: i64) -> Result<&mut Self> {
        self.inner = self.inner.with_date(year, month, day)?;
        Ok(self)
    }

    /// Change the local time of day, keeping the local date.
    pub fn set_time(&mut self, hour: i64, minute: i64, second: i64) -> Result<&mut Self> {
        self.inner = self.inner.with_time(hour, minute, second, 0)?;
        Ok(self)
    }

    pub fn set_microsecond(&mut self, microsecond: u32) -> Result<&mut Self> {
        let time = self.local().time();
        self.inner = self.inner.with_time(
            time.hour() as i64,
            time.minute() as i64,
            time.second() as i64,
            microsecond as i64,
        )?;
        Ok(self)
    }

    pub fn add(&mut self, delta: Duration) -> Result<&mut Self> {
        self.inner = self.inner.shifted(delta)?;
        Ok(self)
    }

    pub fn sub(&mut self, delta: Duration) -> Result<&mut Self> {
        self.inner = self.inner.shifted(negate(delta)?)?;
        Ok(self)
    }

    /// Apply a relative expression such as `"+1 day"` or `"next monday"`,
    /// anchored at this value.
    ///
    /// # Errors
    ///
    /// [`DateError::ConstructionFailure`] if the expression does not resolve;
    /// the value is left unchanged.
    pub fn modify(&mut self, expression: &str) -> Result<&mut Self> {
        self.inner = self.inner.modified(expression)?;
        Ok(self)
    }
}

impl DateTimeLike for MutableDateTime {
    fn utc(&self) -> DateTime<Utc> {
        self.inner.utc
    }

    fn timezone(&self) -> Zone {
        self.inner.zone
    }
}

impl From<ImmutableDateTime> for MutableDateTime {
    fn from(value: ImmutableDateTime) -> Self {
        Self::from_immutable(&value)
    }
}

impl fmt::Display for MutableDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format("c"))
    }
}

// ── ImmutableDateTime ───────────────────────────────────────────────────────

/// A date-time whose transforms return new values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImmutableDateTime {
    inner: Moment,
}

impl ImmutableDateTime {
    pub fn new(utc: DateTime<Utc>, zone: impl Into<Zone>) -> Self {
        Self {
            inner: Moment { utc, zone: zone.into() },
        }
    }

    /// # Errors
    ///
    /// [`DateError::ConstructionFailure`] if the timestamp is out of range.
    pub fn from_timestamp(timestamp: i64, zone: impl Into<Zone>) -> Result<Self> {
        Ok(Self {
            inner: Moment::from_timestamp(timestamp, zone.into())?,
        })
    }

    /// Snapshot of a mutable value; later changes to it are not seen here.
    pub fn from_mutable(value: &MutableDateTime) -> Self {
        Self { inner: value.inner }
    }

    #[must_use]
    pub fn with_timezone(&self, zone: impl Into<Zone>) -> Self {
        Self {
            inner: Moment { utc: self.inner.utc, zone: zone.into() },
        }
    }

    pub fn with_timestamp(&self, timestamp: i64) -> Result<Self> {
        Self::from_timestamp(timestamp, self.inner.zone)
    }

    pub fn with_date(&self, year: i64, month: i64, day: i64) -> Result<Self> {
        Ok(Self {
            inner: self.inner.with_date(year, month, day)?,
        })
    }

    pub fn with_time(&self, hour: i64, minute: i64, second: i64) -> Result<Self> {
        Ok(Self {
            inner: self.inner.with_time(hour, minute, second, 0)?,
        })
    }

    pub fn add(&self, delta: Duration) -> Result<Self> {
        Ok(Self {
            inner: self.inner.shifted(delta)?,
        })
    }

    pub fn sub(&self, delta: Duration) -> Result<Self> {
        Ok(Self {
            inner: self.inner.shifted(negate(delta)?)?,
        })
    }

    /// Resolve a relative expression anchored at this value.
    pub fn modified(&self, expression: &str) -> Result<Self> {
        Ok(Self {
            inner: self.inner.modified(expression)?,
        })
    }
}

impl DateTimeLike for ImmutableDateTime {
    fn utc(&self) -> DateTime<Utc> {
        self.inner.utc
    }

    fn timezone(&self) -> Zone {
        self.inner.zone
    }
}

impl From<&MutableDateTime> for ImmutableDateTime {
    fn from(value: &MutableDateTime) -> Self {
        Self::from_mutable(value)
    }
}

impl From<MutableDateTime> for ImmutableDateTime {
    fn from(value: MutableDateTime) -> Self {
        Self::from_mutable(&value)
    }
}

impl fmt::Display for ImmutableDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format("c"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paris() -> Zone {
        Zone::Named(chrono_tz::Europe::Paris)
    }

    fn base() -> MutableDateTime {
        // 2023-01-05 14:07:09 UTC, 15:07:09 in Paris
        MutableDateTime::from_timestamp(1_672_927_629, paris()).unwrap()
    }

    #[test]
    fn test_reads() {
        let value = base();
        assert_eq!(value.timestamp(), 1_672_927_629);
        assert_eq!(value.microsecond(), 0);
        assert_eq!(value.timezone(), paris());
        assert_eq!(value.format("Y-m-d H:i:s T"), "2023-01-05 15:07:09 CET");
        assert_eq!(value.to_string(), "2023-01-05T15:07:09+01:00");
    }

    #[test]
    fn test_set_timezone_keeps_instant() {
        let mut value = base();
        value.set_timezone(chrono_tz::Asia::Tokyo);
        assert_eq!(value.timestamp(), 1_672_927_629);
        assert_eq!(value.format("H:i e"), "23:07 Asia/Tokyo");
    }

    #[test]
    fn test_set_date_and_time_overflow() {
        let mut value = base();
        value.set_date(2023, 13, 5).unwrap().set_time(25, 0, 0).unwrap();
        assert_eq!(value.format("Y-m-d H:i:s"), "2024-01-06 01:00:00");
    }

    #[test]
    fn test_set_microsecond() {
        let mut value = base();
        value.set_microsecond(250_000).unwrap();
        assert_eq!(value.format("s.u"), "09.250000");
    }

    #[test]
    fn test_add_sub_and_modify_chain() {
        let mut value = base();
        value
            .add(Duration::hours(2))
            .unwrap()
            .sub(Duration::minutes(7))
            .unwrap()
            .modify("+1 day")
            .unwrap();
        assert_eq!(value.format("Y-m-d H:i"), "2023-01-06 17:00");
    }

    #[test]
    fn test_modify_failure_leaves_value() {
        let mut value = base();
        assert!(matches!(
            value.modify("not a date"),
            Err(DateError::ConstructionFailure(_))
        ));
        assert_eq!(value, base());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut value = base();
        let snapshot = ImmutableDateTime::from_mutable(&value);
        value.set_timestamp(0).unwrap().set_timezone(Zone::utc());
        assert_eq!(snapshot.timestamp(), 1_672_927_629);
        assert_eq!(snapshot.timezone(), paris());
    }

    #[test]
    fn test_immutable_transforms_return_new_values() {
        let original = ImmutableDateTime::from_mutable(&base());
        let moved = original.with_time(0, 0, 0).unwrap().add(Duration::days(1)).unwrap();
        assert_eq!(original.format("Y-m-d H:i"), "2023-01-05 15:07");
        assert_eq!(moved.format("Y-m-d H:i"), "2023-01-06 00:00");
        assert_eq!(
            original.modified("first day of next month").unwrap().format("Y-m-d H:i"),
            "2023-02-01 15:07"
        );
    }

    #[test]
    fn test_conversions_preserve_instant_and_zone() {
        let immutable = ImmutableDateTime::from(base());
        let mutable = MutableDateTime::from(immutable);
        assert_eq!(mutable, base());
    }

    #[test]
    fn test_out_of_range_timestamp() {
        assert!(matches!(
            MutableDateTime::from_timestamp(i64::MAX, Zone::utc()),
            Err(DateError::ConstructionFailure(_))
        ));
    }
}
