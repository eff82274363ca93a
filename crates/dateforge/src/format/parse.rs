//! Lenient parsing of a date string under a token format string.
//!
//! Mirrors create-from-format semantics: numeric fields accept fewer digits
//! than they render with, out-of-range values overflow into the next unit,
//! and fields absent from the format are taken from the current time. This is
//! deliberately permissive; [`super::parse_strict`] layers the round-trip check
//! on top.

use chrono::{Datelike, FixedOffset, TimeZone, Timelike, Utc};

use super::{FormatError, Parsed, ParseContext};
use crate::calendar::overflowing_datetime;
use crate::names::{parse_month, parse_weekday};
use crate::zone::Zone;

const NOT_ENOUGH_DATA: &str = "Not enough data available to satisfy format";

/// Characters matched by the `#` token and the `*` stop set.
const SEPARATORS: &[char] = &[';', ':', '/', '.', ',', '-', '(', ')'];

/// Fields collected while walking the format.
#[derive(Debug, Clone, Default)]
struct Fields {
    year: Option<i64>,
    month: Option<i64>,
    day: Option<i64>,
    day_of_year: Option<i64>,
    hour: Option<i64>,
    minute: Option<i64>,
    second: Option<i64>,
    microsecond: Option<i64>,
    zone: Option<Zone>,
    timestamp: Option<i64>,
}

impl Fields {
    /// The `!` modifier: every field back to the Unix epoch.
    fn epoch() -> Self {
        let mut fields = Fields::default();
        fields.fill_unset_with_epoch();
        fields
    }

    /// The `|` modifier: fields not parsed yet become the Unix epoch.
    fn fill_unset_with_epoch(&mut self) {
        self.year.get_or_insert(1970);
        self.month.get_or_insert(1);
        self.day.get_or_insert(1);
        self.hour.get_or_insert(0);
        self.minute.get_or_insert(0);
        self.second.get_or_insert(0);
        self.microsecond.get_or_insert(0);
    }

    fn has_time(&self) -> bool {
        self.hour.is_some()
            || self.minute.is_some()
            || self.second.is_some()
            || self.microsecond.is_some()
    }
}

/// Cursor over the input string.
struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn error(&self, message: &'static str) -> FormatError {
        FormatError::Unparseable {
            position: self.pos,
            message,
        }
    }

    /// Error for a missing field: "not enough data" at end of input.
    fn missing(&self, message: &'static str) -> FormatError {
        if self.rest().is_empty() {
            self.error(NOT_ENOUGH_DATA)
        } else {
            self.error(message)
        }
    }

    /// Read between one and `max` ASCII digits.
    fn digits(&mut self, max: usize, message: &'static str) -> Result<(i64, usize), FormatError> {
        let run = self
            .rest()
            .bytes()
            .take(max)
            .take_while(u8::is_ascii_digit)
            .count();
        if run == 0 {
            return Err(self.missing(message));
        }
        let value = self.rest()[..run]
            .parse::<i64>()
            .map_err(|_| self.error(message))?;
        self.pos += run;
        Ok((value, run))
    }

    fn number(&mut self, max: usize, message: &'static str) -> Result<i64, FormatError> {
        self.digits(max, message).map(|(value, _)| value)
    }

    /// Read exactly `len` digits.
    fn fixed_number(&mut self, len: usize, message: &'static str) -> Result<i64, FormatError> {
        let start = self.pos;
        let (value, run) = self.digits(len, message)?;
        if run != len {
            self.pos = start;
            return Err(self.error(message));
        }
        Ok(value)
    }

    /// Read up to `max` digits as a decimal fraction, scaled to microseconds.
    fn fraction(&mut self, max: usize, message: &'static str) -> Result<i64, FormatError> {
        let (value, run) = self.digits(max, message)?;
        Ok(value * 10_i64.pow((6 - run) as u32))
    }

    fn signed_integer(&mut self, message: &'static str) -> Result<i64, FormatError> {
        let start = self.pos;
        let negative = match self.peek() {
            Some('-') => {
                self.pos += 1;
                true
            }
            Some('+') => {
                self.pos += 1;
                false
            }
            _ => false,
        };
        let run = self.rest().bytes().take_while(u8::is_ascii_digit).count();
        let digits = &self.rest()[..run];
        let value = match digits.parse::<i64>() {
            Ok(v) => v,
            Err(_) => {
                self.pos = start;
                return Err(self.missing(message));
            }
        };
        self.pos += run;
        Ok(if negative { -value } else { value })
    }

    /// Read a run of ASCII letters.
    fn word(&mut self) -> &'a str {
        let rest = self.rest();
        let len = rest
            .bytes()
            .take_while(u8::is_ascii_alphabetic)
            .count();
        self.pos += len;
        &rest[..len]
    }

    /// Read a timezone designator: an offset, an abbreviation, or an IANA id.
    fn zone_text(&mut self) -> &'a str {
        let rest = self.rest();
        let len = if rest.starts_with('+') || rest.starts_with('-') {
            1 + rest[1..]
                .bytes()
                .take(5)
                .take_while(|b| b.is_ascii_digit() || *b == b':')
                .count()
        } else {
            let mut seen_slash = false;
            rest.bytes()
                .take_while(|&b| {
                    if b == b'/' {
                        seen_slash = true;
                    }
                    b.is_ascii_alphabetic()
                        || b == b'_'
                        || b == b'/'
                        || (seen_slash && (b.is_ascii_digit() || b == b'-' || b == b'+'))
                })
                .count()
        };
        self.pos += len;
        &rest[..len]
    }

    fn expect(&mut self, expected: char, message: &'static str) -> Result<(), FormatError> {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.bump();
                Ok(())
            }
            _ => Err(self.missing(message)),
        }
    }
}

/// Parse `input` under `format`.
///
/// # Errors
///
/// Returns [`FormatError::Unparseable`] with the byte position of the first
/// problem: a field that could not be read, a separator that does not match,
/// a meridian without an hour, an unknown timezone, or trailing data.
pub fn parse(format: &str, input: &str, ctx: &ParseContext) -> Result<Parsed, FormatError> {
    let mut scanner = Scanner::new(input);
    let mut fields = Fields::default();
    let mut allow_trailing = false;
    let mut tokens = format.chars();

    while let Some(token) = tokens.next() {
        match token {
            'd' | 'j' => fields.day = Some(scanner.number(2, "A two digit day could not be found")?),
            'S' => {
                let suffix = scanner.rest().get(..2).map(str::to_ascii_lowercase);
                if matches!(suffix.as_deref(), Some("st" | "nd" | "rd" | "th")) {
                    scanner.pos += 2;
                }
            }
            'D' | 'l' => {
                let name = scanner.word().to_ascii_lowercase();
                if parse_weekday(&name).is_none() {
                    return Err(scanner.missing("A textual day could not be found"));
                }
            }
            'z' => {
                fields.day_of_year =
                    Some(scanner.number(3, "A three digit day-of-year could not be found")?)
            }
            'm' | 'n' => {
                fields.month = Some(scanner.number(2, "A two digit month could not be found")?)
            }
            'M' | 'F' => {
                let start = scanner.pos;
                let name = scanner.word().to_ascii_lowercase();
                match parse_month(&name) {
                    Some(month) => fields.month = Some(month as i64),
                    None => {
                        scanner.pos = start;
                        return Err(scanner.missing("A textual month could not be found"));
                    }
                }
            }
            'y' => {
                let year = scanner.number(2, "A two digit year could not be found")?;
                fields.year = Some(if year < 70 { year + 2000 } else { year + 1900 });
            }
            'Y' => fields.year = Some(scanner.number(4, "A four digit year could not be found")?),
            'a' | 'A' => {
                let Some(hour) = fields.hour else {
                    return Err(scanner.error("Meridian can only come after an hour has been found"));
                };
                if hour > 12 {
                    return Err(scanner.error("Hour cannot be higher than 12"));
                }
                let meridian = scanner.rest().get(..2).map(str::to_ascii_lowercase);
                let pm = match meridian.as_deref() {
                    Some("am") => false,
                    Some("pm") => true,
                    _ => return Err(scanner.missing("A meridian could not be found")),
                };
                scanner.pos += 2;
                fields.hour = Some(match (hour, pm) {
                    (12, false) => 0,
                    (12, true) => 12,
                    (h, true) => h + 12,
                    (h, false) => h,
                });
            }
            'g' | 'h' => {
                let hour = scanner.number(2, "A two digit hour could not be found")?;
                if hour > 12 {
                    return Err(scanner.error("Hour cannot be higher than 12"));
                }
                fields.hour = Some(hour);
            }
            'G' | 'H' => fields.hour = Some(scanner.number(2, "A two digit hour could not be found")?),
            'i' => {
                fields.minute =
                    Some(scanner.fixed_number(2, "A two digit minute could not be found")?)
            }
            's' => {
                fields.second =
                    Some(scanner.fixed_number(2, "A two digit second could not be found")?)
            }
            'u' => {
                fields.microsecond =
                    Some(scanner.fraction(6, "A six digit microsecond could not be found")?)
            }
            'v' => {
                fields.microsecond =
                    Some(scanner.fraction(3, "A three digit millisecond could not be found")?)
            }
            'e' | 'T' | 'O' | 'P' | 'p' => {
                let start = scanner.pos;
                let text = scanner.zone_text();
                match Zone::parse(text) {
                    Some(zone) if !text.is_empty() => fields.zone = Some(zone),
                    _ => {
                        scanner.pos = start;
                        return Err(scanner
                            .missing("The timezone could not be found in the database"));
                    }
                }
            }
            'U' => {
                fields.timestamp = Some(scanner.signed_integer("A unix timestamp could not be found")?)
            }
            ' ' => {
                while matches!(scanner.peek(), Some(' ' | '\t')) {
                    scanner.bump();
                }
            }
            '#' => match scanner.peek() {
                Some(ch) if SEPARATORS.contains(&ch) => {
                    scanner.bump();
                }
                _ => {
                    return Err(scanner
                        .missing("The separation symbol ([;:/.,-]) could not be found"))
                }
            },
            ';' | ':' | '/' | '.' | ',' | '-' | '(' | ')' => {
                scanner.expect(token, "The separation symbol could not be found")?
            }
            '?' => {
                if scanner.bump().is_none() {
                    return Err(scanner.error(NOT_ENOUGH_DATA));
                }
            }
            '*' => {
                while let Some(ch) = scanner.peek() {
                    if ch == ' ' || ch.is_ascii_digit() || SEPARATORS.contains(&ch) {
                        break;
                    }
                    scanner.bump();
                }
            }
            '!' => fields = Fields::epoch(),
            '|' => fields.fill_unset_with_epoch(),
            '+' => allow_trailing = true,
            '\\' => match tokens.next() {
                Some(literal) => scanner.expect(literal, "The escaped character could not be found")?,
                None => return Err(scanner.error("Escaped character expected")),
            },
            literal => scanner.expect(literal, "The format separator does not match")?,
        }
    }

    if !scanner.rest().is_empty() && !allow_trailing {
        return Err(scanner.error("Trailing data"));
    }

    assemble(fields, ctx).ok_or(FormatError::Unparseable {
        position: input.len(),
        message: "The parsed date was invalid",
    })
}

/// Combine parsed fields with the current time into an instant.
fn assemble(fields: Fields, ctx: &ParseContext) -> Option<Parsed> {
    if let Some(timestamp) = fields.timestamp {
        let micros = fields.microsecond.unwrap_or(0);
        let instant = Utc
            .timestamp_opt(timestamp, 0)
            .single()?
            .checked_add_signed(chrono::Duration::microseconds(micros))?;
        let zone = fields
            .zone
            .unwrap_or(Zone::Fixed(FixedOffset::east_opt(0)?));
        return Some(Parsed { instant, zone });
    }

    let zone = fields.zone.unwrap_or(ctx.zone);
    let now = zone.localize(&ctx.now);
    let now_micros = (now.nanosecond() % 1_000_000_000) as i64 / 1000;

    let year = fields.year.unwrap_or(now.year() as i64);
    let (month, day) = match fields.day_of_year {
        Some(doy) => (1, doy + 1),
        None => (
            fields.month.unwrap_or(now.month() as i64),
            fields.day.unwrap_or(now.day() as i64),
        ),
    };
    let (hour, minute, second, micro) = if fields.has_time() {
        (
            fields.hour.unwrap_or(0),
            fields.minute.unwrap_or(0),
            fields.second.unwrap_or(0),
            fields.microsecond.unwrap_or(0),
        )
    } else {
        (
            now.hour() as i64,
            now.minute() as i64,
            now.second() as i64,
            now_micros,
        )
    };

    let local = overflowing_datetime(year, month, day, hour, minute, second, micro)?;
    let instant = zone.resolve_local(&local)?;
    Some(Parsed { instant, zone })
}
