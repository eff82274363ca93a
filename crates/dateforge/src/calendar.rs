//! Calendar helpers shared by format parsing and relative resolution.
//!
//! Out-of-range components carry into the next larger unit instead of being
//! rejected: month 13 of 2023 is January 2024, day 0 is the last day of the
//! previous month, hour 25 is 01:00 the next day. The strict callers detect
//! such inputs afterwards by rendering the result and comparing.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};

/// Build a date from possibly out-of-range components.
pub(crate) fn overflowing_date(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    let months = year.checked_mul(12)?.checked_add(month.checked_sub(1)?)?;
    let y = i32::try_from(months.div_euclid(12)).ok()?;
    let m = (months.rem_euclid(12) + 1) as u32;
    let first = NaiveDate::from_ymd_opt(y, m, 1)?;
    first.checked_add_signed(Duration::try_days(day.checked_sub(1)?)?)
}

/// Build a datetime from possibly out-of-range components.
pub(crate) fn overflowing_datetime(
    year: i64,
    month: i64,
    day: i64,
    hour: i64,
    minute: i64,
    second: i64,
    microsecond: i64,
) -> Option<NaiveDateTime> {
    let midnight = overflowing_date(year, month, day)?.and_hms_opt(0, 0, 0)?;
    let seconds = hour
        .checked_mul(3600)?
        .checked_add(minute.checked_mul(60)?)?
        .checked_add(second)?;
    midnight
        .checked_add_signed(Duration::try_seconds(seconds)?)?
        .checked_add_signed(Duration::microseconds(microsecond))
}

/// Add calendar months keeping the day of month, overflowing into the next
/// month when it does not exist (January 31 + 1 month = March 3 or 2).
pub(crate) fn add_months_overflowing(dt: &NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let date = overflowing_date(
        dt.year() as i64,
        (dt.month() as i64).checked_add(months)?,
        dt.day() as i64,
    )?;
    Some(date.and_time(dt.time()))
}

/// Move `(year, month)` by `delta` months. `None` when the year leaves `i32`.
pub(crate) fn shift_month(year: i32, month: u32, delta: i32) -> Option<(i32, u32)> {
    let months = (year as i64 * 12)
        .checked_add(month as i64 - 1)?
        .checked_add(delta as i64)?;
    let y = i32::try_from(months.div_euclid(12)).ok()?;
    Some((y, (months.rem_euclid(12) + 1) as u32))
}

pub(crate) fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (ny, nm) = shift_month(year, month, 1)?;
    NaiveDate::from_ymd_opt(ny, nm, 1)?.pred_opt()
}

pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    last_day_of_month(year, month).map_or(31, |d| d.day())
}

pub(crate) fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

/// First month (1-based) of the quarter containing `month`.
pub(crate) fn quarter_start_month(month: u32) -> u32 {
    ((month - 1) / 3) * 3 + 1
}

/// Find the Nth weekday in a month. ordinal < 0 means "last" (-1), "second to last" (-2), etc.
pub(crate) fn nth_weekday_in_month(
    year: i32,
    month: u32,
    weekday: Weekday,
    ordinal: i32,
) -> Option<NaiveDate> {
    let target = if ordinal > 0 {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let diff = (weekday.num_days_from_monday() as i64
            - first.weekday().num_days_from_monday() as i64)
            .rem_euclid(7);
        first + Duration::days(diff) + Duration::weeks((ordinal - 1) as i64)
    } else {
        let last = last_day_of_month(year, month)?;
        let diff = (last.weekday().num_days_from_monday() as i64
            - weekday.num_days_from_monday() as i64)
            .rem_euclid(7);
        last - Duration::days(diff) - Duration::weeks((-ordinal - 1) as i64)
    };
    (target.month() == month).then_some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_overflowing_month_carries_into_year() {
        assert_eq!(overflowing_date(2023, 13, 5), Some(ymd(2024, 1, 5)));
        assert_eq!(overflowing_date(2023, 0, 5), Some(ymd(2022, 12, 5)));
    }

    #[test]
    fn test_overflowing_day() {
        assert_eq!(overflowing_date(2023, 2, 30), Some(ymd(2023, 3, 2)));
        assert_eq!(overflowing_date(2023, 3, 0), Some(ymd(2023, 2, 28)));
        assert_eq!(overflowing_date(2024, 2, 29), Some(ymd(2024, 2, 29)));
    }

    #[test]
    fn test_overflowing_time() {
        let dt = overflowing_datetime(2023, 12, 31, 24, 0, 0, 0).unwrap();
        assert_eq!(dt, ymd(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap());
        let dt = overflowing_datetime(2023, 1, 1, 10, 75, 61, 1_500_000).unwrap();
        assert_eq!(dt, ymd(2023, 1, 1).and_hms_opt(11, 16, 2).unwrap() + Duration::milliseconds(500));
    }

    #[test]
    fn test_overflowing_rejects_absurd_years() {
        assert_eq!(overflowing_date(i64::MAX / 2, 1, 1), None);
    }

    #[test]
    fn test_extreme_components_are_none() {
        assert_eq!(overflowing_date(2023, i64::MIN, 1), None);
        assert_eq!(overflowing_date(2023, 1, i64::MIN), None);
        let dt = ymd(2023, 1, 31).and_hms_opt(8, 0, 0).unwrap();
        assert_eq!(add_months_overflowing(&dt, i64::MAX), None);
        assert_eq!(shift_month(i32::MAX, 12, 1), None);
        assert_eq!(shift_month(i32::MIN, 1, -1), None);
        assert_eq!(last_day_of_month(i32::MAX, 1), None);
    }

    #[test]
    fn test_add_months_overflow() {
        let jan31 = ymd(2023, 1, 31).and_hms_opt(8, 0, 0).unwrap();
        let result = add_months_overflowing(&jan31, 1).unwrap();
        assert_eq!(result, ymd(2023, 3, 3).and_hms_opt(8, 0, 0).unwrap());
        let result = add_months_overflowing(&jan31, -2).unwrap();
        assert_eq!(result, ymd(2022, 12, 1).and_hms_opt(8, 0, 0).unwrap());
    }

    #[test]
    fn test_month_lengths() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2023, 12), 31);
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert_eq!(shift_month(2026, 1, -1), Some((2025, 12)));
        assert_eq!(quarter_start_month(8), 7);
    }

    #[test]
    fn test_nth_weekday() {
        // March 2026: the 1st is a Sunday.
        assert_eq!(nth_weekday_in_month(2026, 3, Weekday::Mon, 1), Some(ymd(2026, 3, 2)));
        assert_eq!(nth_weekday_in_month(2026, 3, Weekday::Tue, 3), Some(ymd(2026, 3, 17)));
        assert_eq!(nth_weekday_in_month(2026, 3, Weekday::Tue, -1), Some(ymd(2026, 3, 31)));
        assert_eq!(nth_weekday_in_month(2026, 2, Weekday::Mon, 5), None);
    }
}
