//! Best-effort "string to timestamp" resolution.
//!
//! Turns free-form date strings into an instant: Unix timestamps (`@1700000000`),
//! RFC 3339 / RFC 2822 strings, common absolute layouts, and a grammar of
//! relative expressions resolved against an explicit anchor. No system clock
//! is read here; the caller passes "now", which keeps resolution
//! deterministic under test.
//!
//! # Supported Expressions
//!
//! **Absolute**: `"@1700000000"`, `"2026-03-15T14:00:00Z"`,
//! `"Sun, 15 Mar 2026 14:00:00 +0000"`, `"2026-03-15"`, `"2026-03-15 14:00"`,
//! `"2026/03/15"`, `"03/15/2026"`, `"15-03-2026"`, `"15.03.2026"`,
//! `"15 March 2026"`, `"March 15, 2026"`
//!
//! **Anchored**: `"now"`, `"today"`, `"midnight"`, `"noon"`, `"tomorrow"`, `"yesterday"`
//!
//! **Weekdays**: `"monday"`, `"next Monday"`, `"this Friday"`, `"last Wednesday"`,
//! optionally with a time: `"next Tuesday at 2pm"`, `"next Friday evening"`
//!
//! **Day + time**: `"tomorrow at 10:30am"`, `"today noon"`, `"yesterday 17:00"`
//!
//! **Period boundaries**: `"start of week"`, `"end of month"`, `"start of next quarter"`,
//! `"end of last year"`, `"first day of next month"`, `"last day of February 2028"`
//!
//! **Ordinal weekdays**: `"first Monday of March"`, `"last Friday of the month"`,
//! `"third Tuesday of March 2026"`
//!
//! **Offsets**: `"+1 day"`, `"-2 weeks 3 days"`, `"+1d2h30m"`, `"in 2 hours"`,
//! `"30 minutes ago"`, `"a week from now"`, `"next month"`, `"last year"`;
//! an offset may follow any other expression: `"2026-01-31 +1 month"`,
//! `"tomorrow noon +30 minutes"`
//!
//! **Times**: `"morning"` (09:00), `"afternoon"` (13:00), `"evening"` (18:00),
//! `"night"` (21:00), `"eob"` (17:00), `"2pm"`, `"2:30pm"`, `"14:00"`
//!
//! Day, week, month and year offsets move the wall-clock date; hour, minute and
//! second offsets move the instant. Month and year offsets keep the day of
//! month and overflow when it does not exist (`2026-01-31 +1 month` is March 3).

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday,
};

use crate::calendar::{
    add_months_overflowing, last_day_of_month, nth_weekday_in_month, quarter_start_month,
    shift_month,
};
use crate::config::WeekStartDay;
use crate::error::DateError;
use crate::names::{parse_month, parse_weekday};
use crate::zone::Zone;

/// Layouts carrying a time, read as wall-clock time in the zone.
const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Date-only layouts, read as midnight in the zone.
const DATE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%B %d %Y",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Period {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

type Term = (i64, Unit);

/// Resolve a date string to an instant.
///
/// # Arguments
///
/// * `expression` — The string to resolve (see the module docs for the grammar)
/// * `anchor` — The reference "now" instant
/// * `zone` — Zone for wall-clock interpretation of dates and times
/// * `week_start` — First day of the week for week periods
///
/// # Errors
///
/// Returns [`DateError::ConstructionFailure`] if the string cannot be resolved.
pub fn to_timestamp(
    expression: &str,
    anchor: DateTime<Utc>,
    zone: &Zone,
    week_start: WeekStartDay,
) -> Result<DateTime<Utc>, DateError> {
    Resolver::new(anchor, zone, week_start)
        .resolve(expression)
        .ok_or_else(|| {
            DateError::ConstructionFailure(format!(
                "Failed to parse time string ({})",
                expression.trim()
            ))
        })
}

struct Resolver<'z> {
    anchor: DateTime<Utc>,
    local: NaiveDateTime,
    zone: &'z Zone,
    week_start: WeekStartDay,
}

impl<'z> Resolver<'z> {
    fn new(anchor: DateTime<Utc>, zone: &'z Zone, week_start: WeekStartDay) -> Self {
        Self {
            anchor,
            local: zone.localize(&anchor).naive_local(),
            zone,
            week_start,
        }
    }

    fn resolve(&self, expression: &str) -> Option<DateTime<Utc>> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.resolve_whole(trimmed)
            .or_else(|| self.resolve_with_trailing_offset(trimmed))
    }

    /// Try each parser in order of specificity.
    fn resolve_whole(&self, original: &str) -> Option<DateTime<Utc>> {
        let s = normalize_expression(original);
        unix_timestamp(&s)
            .or_else(|| passthrough_rfc3339(original))
            .or_else(|| passthrough_rfc2822(original))
            .or_else(|| self.absolute(original))
            .or_else(|| self.anchored(&s))
            .or_else(|| self.weekday_with_time(&s))
            .or_else(|| self.day_with_time(&s))
            .or_else(|| self.weekday(&s))
            .or_else(|| self.period_boundary(&s))
            .or_else(|| self.day_of_period(&s))
            .or_else(|| self.ordinal_weekday(&s))
            .or_else(|| self.offset(&s))
            .or_else(|| self.time_of_day(&s))
    }

    /// `<expression> <offset terms>`, e.g. "2026-01-31 +1 month".
    fn resolve_with_trailing_offset(&self, original: &str) -> Option<DateTime<Utc>> {
        let words: Vec<&str> = original.split_whitespace().collect();
        (1..words.len()).find_map(|split| {
            let terms = offset_terms(&normalize_expression(&words[split..].join(" ")))?;
            let base = self.resolve_whole(&words[..split].join(" "))?;
            self.apply_terms(base, &terms)
        })
    }

    // ── Instants from wall-clock values ─────────────────────────────────

    fn at(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.zone.resolve_local(&local)
    }

    fn at_midnight(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        self.at(date.and_time(NaiveTime::MIN))
    }

    fn at_end_of_day(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        self.at(date.and_hms_opt(23, 59, 59)?)
    }

    fn today(&self) -> NaiveDate {
        self.local.date()
    }

    // ── Parsers ─────────────────────────────────────────────────────────

    fn absolute(&self, s: &str) -> Option<DateTime<Utc>> {
        DATETIME_LAYOUTS
            .iter()
            .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
            .and_then(|local| self.at(local))
            .or_else(|| {
                DATE_LAYOUTS
                    .iter()
                    .find_map(|layout| NaiveDate::parse_from_str(s, layout).ok())
                    .and_then(|date| self.at_midnight(date))
            })
    }

    /// "now", "today", "midnight", "tomorrow", "yesterday".
    fn anchored(&self, s: &str) -> Option<DateTime<Utc>> {
        if s == "now" {
            return Some(self.anchor);
        }
        if s == "midnight" {
            return self.at_midnight(self.today());
        }
        self.at_midnight(self.relative_day(s)?)
    }

    fn relative_day(&self, s: &str) -> Option<NaiveDate> {
        match s {
            "today" => Some(self.today()),
            "tomorrow" => self.today().succ_opt(),
            "yesterday" => self.today().pred_opt(),
            _ => None,
        }
    }

    /// "next monday", "this friday", "last wed", or a bare weekday (the next
    /// occurrence, today included).
    fn weekday(&self, s: &str) -> Option<DateTime<Utc>> {
        let date = match s.split_once(' ') {
            Some((modifier, day)) => self.weekday_date(modifier, parse_weekday(day)?)?,
            None => self.weekday_date("", parse_weekday(s)?)?,
        };
        self.at_midnight(date)
    }

    fn weekday_date(&self, modifier: &str, weekday: Weekday) -> Option<NaiveDate> {
        let today = self.today();
        let target = weekday.num_days_from_monday() as i64;
        let current = today.weekday().num_days_from_monday() as i64;
        let shift = match modifier {
            // Always future: if today is the same weekday, go to next week
            "next" => match (target - current).rem_euclid(7) {
                0 => 7,
                n => n,
            },
            // Same week: may be past or future
            "this" => target - current,
            // Always past: if today is the same weekday, go to last week
            "last" | "previous" => match (current - target).rem_euclid(7) {
                0 => -7,
                n => -n,
            },
            "" => (target - current).rem_euclid(7),
            _ => return None,
        };
        today.checked_add_signed(Duration::days(shift))
    }

    /// "next tuesday at 2pm", "last friday evening".
    fn weekday_with_time(&self, s: &str) -> Option<DateTime<Utc>> {
        let mut parts = s.splitn(3, ' ');
        let modifier = parts.next()?;
        let weekday = parse_weekday(parts.next()?)?;
        let time = parse_time_phrase(parts.next()?)?;
        let date = self.weekday_date(modifier, weekday)?;
        self.at(date.and_time(time))
    }

    /// "tomorrow at 2pm", "today noon", "yesterday 17:00".
    fn day_with_time(&self, s: &str) -> Option<DateTime<Utc>> {
        let (day, time) = s.split_once(' ')?;
        let date = self.relative_day(day)?;
        self.at(date.and_time(parse_time_phrase(time)?))
    }

    /// "start of week", "end of next month", "start of last quarter", "end of today".
    fn period_boundary(&self, s: &str) -> Option<DateTime<Utc>> {
        let (is_start, rest) = if let Some(r) = s.strip_prefix("start of ") {
            (true, r)
        } else if let Some(r) = s.strip_prefix("end of ") {
            (false, r)
        } else {
            return None;
        };
        let (period, shift) = parse_period_phrase(rest)?;
        if is_start {
            self.at_midnight(self.period_start(period, shift)?)
        } else {
            self.at_end_of_day(self.period_start(period, shift + 1)?.pred_opt()?)
        }
    }

    /// First day of the `period` containing today, moved by `shift` periods.
    fn period_start(&self, period: Period, shift: i32) -> Option<NaiveDate> {
        let today = self.today();
        match period {
            Period::Day => today.checked_add_signed(Duration::days(shift as i64)),
            Period::Week => {
                let since_start = self.week_start.days_from_start(today.weekday());
                today.checked_add_signed(Duration::days(shift as i64 * 7 - since_start))
            }
            Period::Month => {
                let (y, m) = shift_month(today.year(), today.month(), shift)?;
                NaiveDate::from_ymd_opt(y, m, 1)
            }
            Period::Quarter => {
                let (y, m) =
                    shift_month(today.year(), quarter_start_month(today.month()), shift * 3)?;
                NaiveDate::from_ymd_opt(y, m, 1)
            }
            Period::Year => NaiveDate::from_ymd_opt(today.year() + shift, 1, 1),
        }
    }

    /// "first day of next month", "last day of this month" keep the time of
    /// day; "first day of january 2027", "last day of feb" are at midnight.
    fn day_of_period(&self, s: &str) -> Option<DateTime<Utc>> {
        let (first, rest) = if let Some(r) = s.strip_prefix("first day of ") {
            (true, r)
        } else if let Some(r) = s.strip_prefix("last day of ") {
            (false, r)
        } else {
            return None;
        };

        if let Some((Period::Month, shift)) = parse_period_phrase(rest) {
            let start = self.period_start(Period::Month, shift)?;
            let date = if first {
                start
            } else {
                last_day_of_month(start.year(), start.month())?
            };
            return self.at(date.and_time(self.local.time()));
        }

        let (month, year) = self.month_and_year(rest)?;
        let date = if first {
            NaiveDate::from_ymd_opt(year, month, 1)?
        } else {
            last_day_of_month(year, month)?
        };
        self.at_midnight(date)
    }

    /// "first monday of march", "last friday of month", "third tuesday of march 2026".
    fn ordinal_weekday(&self, s: &str) -> Option<DateTime<Utc>> {
        let (head, target) = s.split_once(" of ")?;
        let (ordinal, weekday) = head.split_once(' ')?;
        let ordinal = parse_ordinal(ordinal)?;
        let weekday = parse_weekday(weekday)?;

        let (month, year) = match parse_period_phrase(target) {
            Some((Period::Month, shift)) => {
                let start = self.period_start(Period::Month, shift)?;
                (start.month(), start.year())
            }
            Some(_) => return None,
            None => self.month_and_year(target)?,
        };
        self.at_midnight(nth_weekday_in_month(year, month, weekday, ordinal)?)
    }

    /// "march" or "march 2026"; the year defaults to the anchor's.
    fn month_and_year(&self, s: &str) -> Option<(u32, i32)> {
        let mut parts = s.split_whitespace();
        let month = parse_month(parts.next()?)?;
        let year = match parts.next() {
            Some(y) => y.parse::<i32>().ok()?,
            None => self.today().year(),
        };
        if parts.next().is_some() {
            return None;
        }
        Some((month, year))
    }

    /// "in 2 hours", "30 minutes ago", "a week from now", "next month",
    /// "+1 day", "-1w2d".
    fn offset(&self, s: &str) -> Option<DateTime<Utc>> {
        let terms = if let Some(rest) = s.strip_prefix("in ") {
            offset_terms(rest)?
        } else if let Some(rest) = s.strip_suffix(" ago") {
            negate(offset_terms(rest)?)?
        } else if let Some(rest) = s.strip_suffix(" from now") {
            offset_terms(rest)?
        } else {
            relative_unit(s)
                .or_else(|| offset_terms(s))
                .or_else(|| compact_offset(s))?
        };
        self.apply_terms(self.anchor, &terms)
    }

    fn apply_terms(&self, base: DateTime<Utc>, terms: &[Term]) -> Option<DateTime<Utc>> {
        let mut local = self.zone.localize(&base).naive_local();
        let mut calendar_shift = false;
        let mut seconds: i64 = 0;
        for &(n, unit) in terms {
            match unit {
                Unit::Year => {
                    local = add_months_overflowing(&local, n.checked_mul(12)?)?;
                    calendar_shift = true;
                }
                Unit::Month => {
                    local = add_months_overflowing(&local, n)?;
                    calendar_shift = true;
                }
                Unit::Week => {
                    local = local.checked_add_signed(Duration::try_weeks(n)?)?;
                    calendar_shift = true;
                }
                Unit::Day => {
                    local = local.checked_add_signed(Duration::try_days(n)?)?;
                    calendar_shift = true;
                }
                Unit::Hour => seconds = seconds.checked_add(n.checked_mul(3600)?)?,
                Unit::Minute => seconds = seconds.checked_add(n.checked_mul(60)?)?,
                Unit::Second => seconds = seconds.checked_add(n)?,
            }
        }
        let shifted = if calendar_shift { self.at(local)? } else { base };
        shifted.checked_add_signed(Duration::try_seconds(seconds)?)
    }

    /// "morning", "noon", "2pm", "14:30" on the anchor's day.
    fn time_of_day(&self, s: &str) -> Option<DateTime<Utc>> {
        let time = named_time(s).or_else(|| parse_time_string(s))?;
        self.at(self.today().and_time(time))
    }
}

// ── Free-standing parsers ───────────────────────────────────────────────────

/// Normalize expression: trim, lowercase, collapse whitespace, strip "the"
/// (but not "a"/"an", which are meaningful in "a week from now").
fn normalize_expression(s: &str) -> String {
    let lowered = s.trim().to_lowercase();
    let words: Vec<&str> = lowered
        .split_whitespace()
        .filter(|w| *w != "the")
        .collect();
    words.join(" ")
}

/// "@1700000000", "@-60", "@1700000000.5".
fn unix_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let body = s.strip_prefix('@')?;
    let (whole, frac) = body.split_once('.').unwrap_or((body, ""));
    let seconds: i64 = whole.parse().ok()?;
    if frac.len() > 6 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let micros = if frac.is_empty() {
        0
    } else {
        frac.parse::<i64>().ok()? * 10_i64.pow(6 - frac.len() as u32)
    };
    let micros = if seconds < 0 || whole.starts_with('-') { -micros } else { micros };
    Utc.timestamp_opt(seconds, 0)
        .single()?
        .checked_add_signed(Duration::microseconds(micros))
}

fn passthrough_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn passthrough_rfc2822(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// "week", "next month", "last quarter", "this year", "today" → (period, shift).
fn parse_period_phrase(s: &str) -> Option<(Period, i32)> {
    if s == "today" {
        return Some((Period::Day, 0));
    }
    let (shift, unit) = match s.split_once(' ') {
        Some(("next", unit)) => (1, unit),
        Some(("last" | "previous", unit)) => (-1, unit),
        Some(("this", unit)) => (0, unit),
        Some(_) => return None,
        None => (0, s),
    };
    let period = match unit {
        "day" => Period::Day,
        "week" => Period::Week,
        "month" => Period::Month,
        "quarter" => Period::Quarter,
        "year" => Period::Year,
        _ => return None,
    };
    Some((period, shift))
}

/// "next week", "last month", "this year" → a one-unit offset.
fn relative_unit(s: &str) -> Option<Vec<Term>> {
    let (modifier, unit) = s.split_once(' ')?;
    let n = match modifier {
        "next" => 1,
        "last" | "previous" => -1,
        "this" => 0,
        _ => return None,
    };
    let (multiplier, unit) = parse_unit(unit)?;
    Some(vec![(n * multiplier, unit)])
}

/// Whitespace-separated terms: "+1 day", "-2 weeks 3 days", "1 hour and 30 minutes",
/// "a week". Each number carries its own sign.
fn offset_terms(s: &str) -> Option<Vec<Term>> {
    let mut words = s
        .split_whitespace()
        .filter(|w| *w != "and")
        .map(|w| w.trim_end_matches(','));
    let mut terms = Vec::new();
    while let Some(word) = words.next() {
        let n: i64 = match word {
            "a" | "an" => 1,
            _ => word.strip_prefix('+').unwrap_or(word).parse().ok()?,
        };
        let (multiplier, unit) = parse_unit(words.next()?)?;
        terms.push((n.checked_mul(multiplier)?, unit));
    }
    (!terms.is_empty()).then_some(terms)
}

/// Compact durations: "+2h", "-30m", "+1d2h30m", "-2w3d".
fn compact_offset(s: &str) -> Option<Vec<Term>> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1i64, &s[1..]),
        b'-' => (-1i64, &s[1..]),
        _ => return None,
    };
    let mut terms = Vec::new();
    let mut num_buf = String::new();
    for ch in rest.chars() {
        if ch.is_ascii_digit() {
            num_buf.push(ch);
            continue;
        }
        if num_buf.is_empty() {
            return None;
        }
        let n: i64 = num_buf.parse().ok()?;
        num_buf.clear();
        let unit = match ch {
            'w' => Unit::Week,
            'd' => Unit::Day,
            'h' => Unit::Hour,
            'm' => Unit::Minute,
            's' => Unit::Second,
            _ => return None,
        };
        terms.push((sign * n, unit));
    }
    // Trailing number without unit
    if !num_buf.is_empty() || terms.is_empty() {
        return None;
    }
    Some(terms)
}

fn negate(terms: Vec<Term>) -> Option<Vec<Term>> {
    terms
        .into_iter()
        .map(|(n, unit)| Some((n.checked_neg()?, unit)))
        .collect()
}

/// Map a unit word to (multiplier, unit).
fn parse_unit(s: &str) -> Option<(i64, Unit)> {
    let unit = match s {
        "second" | "seconds" | "sec" | "secs" => Unit::Second,
        "minute" | "minutes" | "min" | "mins" => Unit::Minute,
        "hour" | "hours" | "hr" | "hrs" => Unit::Hour,
        "day" | "days" => Unit::Day,
        "week" | "weeks" | "wk" | "wks" => Unit::Week,
        "fortnight" | "fortnights" => return Some((2, Unit::Week)),
        "month" | "months" => Unit::Month,
        "year" | "years" => Unit::Year,
        _ => return None,
    };
    Some((1, unit))
}

/// Parse an ordinal: "first"→1, "second"→2, ..., "last"→-1.
fn parse_ordinal(s: &str) -> Option<i32> {
    match s {
        "first" | "1st" => Some(1),
        "second" | "2nd" => Some(2),
        "third" | "3rd" => Some(3),
        "fourth" | "4th" => Some(4),
        "fifth" | "5th" => Some(5),
        "last" => Some(-1),
        _ => None,
    }
}

/// "at 2pm", "at noon", "2pm", "evening".
fn parse_time_phrase(s: &str) -> Option<NaiveTime> {
    let s = s.strip_prefix("at ").unwrap_or(s);
    named_time(s).or_else(|| parse_time_string(s))
}

/// Map named time to NaiveTime.
fn named_time(s: &str) -> Option<NaiveTime> {
    match s {
        "morning" | "start of business" | "sob" => NaiveTime::from_hms_opt(9, 0, 0),
        "noon" | "midday" | "lunch" => NaiveTime::from_hms_opt(12, 0, 0),
        "afternoon" => NaiveTime::from_hms_opt(13, 0, 0),
        "end of day" | "end of business" | "eob" => NaiveTime::from_hms_opt(17, 0, 0),
        "evening" => NaiveTime::from_hms_opt(18, 0, 0),
        "night" => NaiveTime::from_hms_opt(21, 0, 0),
        "midnight" => NaiveTime::from_hms_opt(0, 0, 0),
        _ => None,
    }
}

/// Parse a time string: "2pm", "2:30pm", "2 pm", "14:00", "14:30:00".
fn parse_time_string(s: &str) -> Option<NaiveTime> {
    let s = s.trim();

    for layout in ["%H:%M:%S%.f", "%H:%M"] {
        if let Ok(t) = NaiveTime::parse_from_str(s, layout) {
            return Some(t);
        }
    }

    let compact = s.replace(' ', "");
    let (clock, is_pm) = if let Some(c) = compact.strip_suffix("pm") {
        (c, true)
    } else if let Some(c) = compact.strip_suffix("am") {
        (c, false)
    } else {
        return None;
    };

    let mut parts = clock.split(':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = parts.next().map_or(Some(0), |m| m.parse().ok())?;
    let second: u32 = parts.next().map_or(Some(0), |s| s.parse().ok())?;
    if hour == 0 || hour > 12 || parts.next().is_some() {
        return None;
    }
    let hour24 = match (hour, is_pm) {
        (12, true) => 12,
        (12, false) => 0,
        (h, true) => h + 12,
        (h, false) => h,
    };
    NaiveTime::from_hms_opt(hour24, minute, second)
}

// ── Tests ───────────────────────────────────────────────────────────────────
