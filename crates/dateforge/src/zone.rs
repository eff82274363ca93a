//! The timezone attached to a date-time value.
//!
//! A value built from a timestamp carries the configured IANA zone, one parsed
//! from `+02:00` carries a fixed offset, and one parsed from `EST` keeps the
//! abbreviation so it renders back the way it was written.

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// An IANA zone from the bundled database.
    Named(Tz),
    /// A bare UTC offset such as `+05:30`.
    Fixed(FixedOffset),
    /// A zone abbreviation such as `EST`, pinned to its offset.
    Abbreviation {
        abbr: &'static str,
        offset: FixedOffset,
        dst: bool,
    },
}

/// Known abbreviations: (name, offset seconds, is DST).
const ABBREVIATIONS: &[(&str, i32, bool)] = &[
    ("Z", 0, false),
    ("GMT", 0, false),
    ("WET", 0, false),
    ("WEST", 3600, true),
    ("BST", 3600, true),
    ("CET", 3600, false),
    ("CEST", 7200, true),
    ("EET", 7200, false),
    ("EEST", 10800, true),
    ("MSK", 10800, false),
    ("AWST", 28800, false),
    ("JST", 32400, false),
    ("KST", 32400, false),
    ("ACST", 34200, false),
    ("AEST", 36000, false),
    ("AEDT", 39600, true),
    ("NZST", 43200, false),
    ("NZDT", 46800, true),
    ("HST", -36000, false),
    ("AKST", -32400, false),
    ("AKDT", -28800, true),
    ("PST", -28800, false),
    ("PDT", -25200, true),
    ("MST", -25200, false),
    ("MDT", -21600, true),
    ("CST", -21600, false),
    ("CDT", -18000, true),
    ("EST", -18000, false),
    ("EDT", -14400, true),
];

impl Zone {
    pub fn utc() -> Self {
        Zone::Named(Tz::UTC)
    }

    /// Look up a zone by the text a timezone token accepts: `UTC`, a known
    /// abbreviation, an IANA identifier, or a `±hh[:mm]` offset.
    pub fn parse(s: &str) -> Option<Zone> {
        if s.starts_with('+') || s.starts_with('-') {
            return parse_offset(s).map(Zone::Fixed);
        }
        if s.eq_ignore_ascii_case("utc") {
            return Some(Zone::utc());
        }
        if let Some(zone) = Self::abbreviation(s) {
            return Some(zone);
        }
        s.parse::<Tz>().ok().map(Zone::Named)
    }

    fn abbreviation(s: &str) -> Option<Zone> {
        ABBREVIATIONS
            .iter()
            .find(|(abbr, _, _)| abbr.eq_ignore_ascii_case(s))
            .and_then(|&(abbr, secs, dst)| {
                Some(Zone::Abbreviation {
                    abbr,
                    offset: FixedOffset::east_opt(secs)?,
                    dst,
                })
            })
    }

    /// The UTC offset in effect at `utc`.
    pub fn offset_at(&self, utc: &DateTime<Utc>) -> FixedOffset {
        match self {
            Zone::Named(tz) => tz.offset_from_utc_datetime(&utc.naive_utc()).fix(),
            Zone::Fixed(offset) => *offset,
            Zone::Abbreviation { offset, .. } => *offset,
        }
    }

    /// The instant expressed as wall-clock time in this zone.
    pub fn localize(&self, utc: &DateTime<Utc>) -> DateTime<FixedOffset> {
        utc.with_timezone(&self.offset_at(utc))
    }

    /// Resolve a wall-clock time in this zone to an instant.
    ///
    /// Ambiguous times (DST fall-back) resolve to the earlier instant. Times
    /// that fall in a DST gap are read with the offset in effect before the
    /// gap, which moves them forward by the gap length.
    pub fn resolve_local(&self, local: &NaiveDateTime) -> Option<DateTime<Utc>> {
        let tz = match self {
            Zone::Named(tz) => tz,
            Zone::Fixed(offset) | Zone::Abbreviation { offset, .. } => {
                return offset
                    .from_local_datetime(local)
                    .single()
                    .map(|dt| dt.with_timezone(&Utc));
            }
        };
        if let Some(dt) = tz.from_local_datetime(local).earliest() {
            return Some(dt.with_timezone(&Utc));
        }
        let before_gap = local.checked_sub_signed(Duration::days(1))?;
        let offset = tz.offset_from_utc_datetime(&before_gap).fix();
        offset
            .from_local_datetime(local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Identifier as the `e` token renders it.
    pub fn name(&self) -> String {
        match self {
            Zone::Named(tz) => tz.name().to_string(),
            Zone::Fixed(offset) => format_offset(offset.local_minus_utc(), true),
            Zone::Abbreviation { abbr, .. } => abbr.to_string(),
        }
    }

    /// Abbreviation in effect at `utc`, as the `T` token renders it.
    pub fn abbreviation_at(&self, utc: &DateTime<Utc>) -> String {
        match self {
            Zone::Named(tz) => tz.offset_from_utc_datetime(&utc.naive_utc()).to_string(),
            Zone::Fixed(offset) => format_offset(offset.local_minus_utc(), true),
            Zone::Abbreviation { abbr, .. } => abbr.to_string(),
        }
    }

    /// Whether daylight saving time is in effect at `utc`.
    pub fn is_dst(&self, utc: &DateTime<Utc>) -> bool {
        match self {
            Zone::Named(tz) => {
                tz.offset_from_utc_datetime(&utc.naive_utc()).dst_offset() != Duration::zero()
            }
            Zone::Fixed(_) => false,
            Zone::Abbreviation { dst, .. } => *dst,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl From<Tz> for Zone {
    fn from(tz: Tz) -> Self {
        Zone::Named(tz)
    }
}

impl From<FixedOffset> for Zone {
    fn from(offset: FixedOffset) -> Self {
        Zone::Fixed(offset)
    }
}

/// Format an offset in seconds as `+hh:mm` (`colon`) or `+hhmm`.
pub(crate) fn format_offset(offset_secs: i32, colon: bool) -> String {
    let sign = if offset_secs >= 0 { "+" } else { "-" };
    let abs_secs = offset_secs.unsigned_abs();
    let hours = abs_secs / 3600;
    let minutes = (abs_secs % 3600) / 60;
    if colon {
        format!("{sign}{hours:02}:{minutes:02}")
    } else {
        format!("{sign}{hours:02}{minutes:02}")
    }
}

/// Parse `+h`, `+hh`, `+hhmm` or `+hh:mm` into an offset.
pub(crate) fn parse_offset(s: &str) -> Option<FixedOffset> {
    let sign = match s.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let body = &s[1..];
    let (hours, minutes) = match body.split_once(':') {
        Some((h, m)) => (h, m),
        None if body.len() > 2 => body.split_at(body.len() - 2),
        None => (body, "0"),
    };
    if hours.is_empty()
        || hours.len() > 2
        || !hours.bytes().all(|b| b.is_ascii_digit())
        || !minutes.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
