//! Token format strings.
//!
//! Each character of a format string is either a token standing for a date
//! component or a literal. The token set is the conventional one used by
//! date-formatting functions:
//!
//! | Token | Component | Example |
//! |---|---|---|
//! | `d` / `j` | day of month, padded / unpadded | `05` / `5` |
//! | `D` / `l` | day name, short / full | `Thu` / `Thursday` |
//! | `N` / `w` | ISO weekday (1=Mon) / weekday (0=Sun) | `4` / `4` |
//! | `S` | English ordinal suffix | `th` |
//! | `z` | day of year from 0 | `4` |
//! | `W` / `o` | ISO week number / ISO week-numbering year | `01` / `2023` |
//! | `m` / `n` | month, padded / unpadded | `01` / `1` |
//! | `M` / `F` | month name, short / full | `Jan` / `January` |
//! | `t` / `L` | days in month / leap year flag | `31` / `0` |
//! | `Y` / `y` | year, at least four digits / two digits | `2023` / `23` |
//! | `a` / `A` | meridian, lower / upper | `pm` / `PM` |
//! | `g` / `h` | 12-hour hour, unpadded / padded | `2` / `02` |
//! | `G` / `H` | 24-hour hour, unpadded / padded | `14` / `14` |
//! | `i` / `s` | minutes / seconds | `07` / `09` |
//! | `u` / `v` | microseconds / milliseconds | `123456` / `123` |
//! | `B` | Swatch Internet Time | `629` |
//! | `e` / `T` | zone identifier / abbreviation | `Europe/Paris` / `CET` |
//! | `P` / `O` / `p` | offset `+01:00` / `+0100` / `Z` when zero | |
//! | `Z` / `I` | offset in seconds / DST flag | `3600` / `0` |
//! | `c` / `r` / `U` | ISO 8601 / RFC 2822 / Unix seconds | |
//!
//! `\` escapes the next character. Parsing additionally understands the
//! modifiers `!`, `|`, `+`, `*`, `?`, `#` and a space matching any run of
//! blanks; see [`parse()`].

mod parse;
mod render;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::zone::Zone;

pub use parse::parse;
pub use render::render;

/// What parsing needs besides the input: the instant that fills absent
/// fields and the zone used when the input names none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseContext {
    pub now: DateTime<Utc>,
    pub zone: Zone,
}

impl ParseContext {
    pub fn new(now: DateTime<Utc>, zone: Zone) -> Self {
        Self { now, zone }
    }
}

/// A successfully parsed instant and the zone it was read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parsed {
    pub instant: DateTime<Utc>,
    pub zone: Zone,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The input could not be read under the format.
    #[error("{message} at position {position}")]
    Unparseable {
        position: usize,
        message: &'static str,
    },

    /// The input parsed, but renders differently under the same format.
    #[error("'{input}' reads back as '{rendered}'")]
    Mismatch { input: String, rendered: String },
}

/// Parse `input` under `format` and require the result to render back to
/// exactly `input`.
///
/// This turns the lenient [`parse()`] into a strict check: two-digit years
/// under `Y`, overflowed months, unpadded numbers under padded tokens and
/// differently-cased names are all rejected.
///
/// # Errors
///
/// [`FormatError::Unparseable`] if parsing fails, [`FormatError::Mismatch`]
/// if the round trip does not reproduce `input` byte-for-byte.
pub fn parse_strict(format: &str, input: &str, ctx: &ParseContext) -> Result<Parsed, FormatError> {
    let parsed = parse(format, input, ctx)?;
    let rendered = render(&parsed.instant, &parsed.zone, format);
    if rendered != input {
        return Err(FormatError::Mismatch {
            input: input.to_string(),
            rendered,
        });
    }
    Ok(parsed)
}
