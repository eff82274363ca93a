//! Rendering a date-time with a token format string.

use std::fmt::Write;

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};

use crate::calendar::{days_in_month, is_leap_year};
use crate::names::{day_name, month_name, ordinal_suffix};
use crate::zone::{format_offset, Zone};

/// ISO 8601 layout used by the `c` token.
const ISO_8601: &str = "Y-m-d\\TH:i:sP";

/// RFC 2822 layout used by the `r` token.
const RFC_2822: &str = "D, d M Y H:i:s O";

/// Render `utc`, as seen from `zone`, with a token format string.
///
/// `\` makes the next character literal; characters that are not tokens are
/// copied through unchanged.
pub fn render(utc: &DateTime<Utc>, zone: &Zone, format: &str) -> String {
    let local = zone.localize(utc);
    let mut out = String::with_capacity(format.len() * 2);
    let mut chars = format.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
            continue;
        }
        render_token(ch, utc, &local, zone, &mut out);
    }
    out
}

fn render_token(
    token: char,
    utc: &DateTime<Utc>,
    local: &DateTime<FixedOffset>,
    zone: &Zone,
    out: &mut String,
) {
    let offset_secs = local.offset().local_minus_utc();
    // Writing into a String cannot fail.
    let _ = match token {
        // Day
        'd' => write!(out, "{:02}", local.day()),
        'D' => write!(out, "{}", &day_name(local.weekday())[..3]),
        'j' => write!(out, "{}", local.day()),
        'l' => write!(out, "{}", day_name(local.weekday())),
        'N' => write!(out, "{}", local.weekday().number_from_monday()),
        'S' => write!(out, "{}", ordinal_suffix(local.day())),
        'w' => write!(out, "{}", local.weekday().num_days_from_sunday()),
        'z' => write!(out, "{}", local.ordinal0()),
        // Week
        'W' => write!(out, "{:02}", local.iso_week().week()),
        // Month
        'F' => write!(out, "{}", month_name(local.month())),
        'm' => write!(out, "{:02}", local.month()),
        'M' => write!(out, "{}", &month_name(local.month())[..3]),
        'n' => write!(out, "{}", local.month()),
        't' => write!(out, "{}", days_in_month(local.year(), local.month())),
        // Year
        'L' => write!(out, "{}", u8::from(is_leap_year(local.year()))),
        'o' => write!(out, "{}", local.iso_week().year()),
        'Y' => write_year(out, local.year()),
        'y' => write!(out, "{:02}", local.year().rem_euclid(100)),
        // Time
        'a' => write!(out, "{}", if local.hour() < 12 { "am" } else { "pm" }),
        'A' => write!(out, "{}", if local.hour() < 12 { "AM" } else { "PM" }),
        'B' => write!(out, "{:03}", swatch_beat(utc)),
        'g' => write!(out, "{}", hour12(local.hour())),
        'G' => write!(out, "{}", local.hour()),
        'h' => write!(out, "{:02}", hour12(local.hour())),
        'H' => write!(out, "{:02}", local.hour()),
        'i' => write!(out, "{:02}", local.minute()),
        's' => write!(out, "{:02}", local.second()),
        'u' => write!(out, "{:06}", microsecond(local)),
        'v' => write!(out, "{:03}", microsecond(local) / 1000),
        // Timezone
        'e' => write!(out, "{}", zone.name()),
        'I' => write!(out, "{}", u8::from(zone.is_dst(utc))),
        'O' => write!(out, "{}", format_offset(offset_secs, false)),
        'P' => write!(out, "{}", format_offset(offset_secs, true)),
        'p' if offset_secs == 0 => write!(out, "Z"),
        'p' => write!(out, "{}", format_offset(offset_secs, true)),
        'T' => write!(out, "{}", zone.abbreviation_at(utc)),
        'Z' => write!(out, "{}", offset_secs),
        // Full date/time
        'c' => write!(out, "{}", render(utc, zone, ISO_8601)),
        'r' => write!(out, "{}", render(utc, zone, RFC_2822)),
        'U' => write!(out, "{}", utc.timestamp()),
        other => {
            out.push(other);
            Ok(())
        }
    };
}

/// Years render with at least four digits; years before 1 BCE carry a `-`.
fn write_year(out: &mut String, year: i32) -> std::fmt::Result {
    if year < 0 {
        write!(out, "-{:04}", year.unsigned_abs())
    } else {
        write!(out, "{:04}", year)
    }
}

fn hour12(hour: u32) -> u32 {
    match hour % 12 {
        0 => 12,
        h => h,
    }
}

fn microsecond(local: &DateTime<FixedOffset>) -> u32 {
    (local.nanosecond() % 1_000_000_000) / 1000
}

/// Swatch Internet Time: 1000 beats per day, anchored at UTC+01:00.
fn swatch_beat(utc: &DateTime<Utc>) -> i64 {
    let seconds = (utc.timestamp() + 3600).rem_euclid(86_400);
    (seconds * 10 / 864) % 1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant() -> DateTime<Utc> {
        // Thursday, January 5, 2023, 14:07:09.123456 UTC
        Utc.with_ymd_and_hms(2023, 1, 5, 14, 7, 9).unwrap() + chrono::Duration::microseconds(123_456)
    }

    fn utc_render(format: &str) -> String {
        render(&instant(), &Zone::utc(), format)
    }

    #[test]
    fn test_render_date_tokens() {
        assert_eq!(utc_render("Y-m-d"), "2023-01-05");
        assert_eq!(utc_render("D, j M y"), "Thu, 5 Jan 23");
        assert_eq!(utc_render("l jS F"), "Thursday 5th January");
        assert_eq!(utc_render("N w z t L"), "4 4 4 31 0");
        assert_eq!(utc_render("W o"), "01 2023");
    }

    #[test]
    fn test_render_time_tokens() {
        assert_eq!(utc_render("H:i:s"), "14:07:09");
        assert_eq!(utc_render("g:i A"), "2:07 PM");
        assert_eq!(utc_render("h a G"), "02 pm 14");
        assert_eq!(utc_render("u v"), "123456 123");
        assert_eq!(utc_render("B"), "629");
    }

    #[test]
    fn test_render_midnight_and_noon_twelve_hour() {
        let midnight = Utc.with_ymd_and_hms(2023, 1, 5, 0, 30, 0).unwrap();
        let noon = Utc.with_ymd_and_hms(2023, 1, 5, 12, 30, 0).unwrap();
        assert_eq!(render(&midnight, &Zone::utc(), "g:i a"), "12:30 am");
        assert_eq!(render(&noon, &Zone::utc(), "g:i a"), "12:30 pm");
    }

    #[test]
    fn test_render_timezone_tokens() {
        let zone = Zone::Named(chrono_tz::America::New_York);
        assert_eq!(
            render(&instant(), &zone, "e T P O p Z I"),
            "America/New_York EST -05:00 -0500 -05:00 -18000 0"
        );
        assert_eq!(utc_render("p e T"), "Z UTC UTC");
    }

    #[test]
    fn test_render_compound_tokens() {
        let zone = Zone::Named(chrono_tz::Europe::Paris);
        assert_eq!(render(&instant(), &zone, "c"), "2023-01-05T15:07:09+01:00");
        assert_eq!(
            render(&instant(), &zone, "r"),
            "Thu, 05 Jan 2023 15:07:09 +0100"
        );
        assert_eq!(utc_render("U"), "1672927629");
    }

    #[test]
    fn test_render_escapes_and_literals() {
        assert_eq!(utc_render("\\Y\\e\\a\\r: Y"), "Year: 2023");
        assert_eq!(utc_render("[Y]"), "[2023]");
        assert_eq!(utc_render("Y\\"), "2023");
    }

    #[test]
    fn test_render_short_years_pad() {
        let early = Utc.with_ymd_and_hms(99, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(render(&early, &Zone::utc(), "Y y"), "0099 99");
    }
}
