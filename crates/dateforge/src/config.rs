//! Factory configuration and the process-wide default.
//!
//! The construction path needs a "default timezone" for values built from a
//! timestamp or a free-form string. Rather than reading a hidden global at
//! every call, the timezone lives in a [`FactoryConfig`] owned by each factory.
//! [`FactoryConfig::global`] reads the environment once, on first use, and is
//! what the free-function forms of the factory are built from.

use std::sync::OnceLock;

use chrono::Weekday;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::DateError;

/// Environment variable consulted first for the default timezone.
pub const TIMEZONE_ENV: &str = "DATEFORGE_TIMEZONE";

/// Conventional fallback variable for the default timezone.
pub const TZ_ENV: &str = "TZ";

/// Which day begins a week for period expressions ("start of week", "next week", etc.).
///
/// Does **not** affect named-weekday expressions like "next Monday" or "last Friday".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStartDay {
    /// ISO 8601 standard (Monday = day 0 of the week).
    #[default]
    Monday,
    /// US/Canada convention (Sunday = day 0 of the week).
    Sunday,
}

impl WeekStartDay {
    /// How many days `weekday` is from the week-start day.
    pub(crate) fn days_from_start(self, weekday: Weekday) -> i64 {
        match self {
            WeekStartDay::Monday => weekday.num_days_from_monday() as i64,
            WeekStartDay::Sunday => weekday.num_days_from_sunday() as i64,
        }
    }
}

/// Settings shared by the factory and validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Zone given to values built from timestamps and free-form strings, and
    /// the zone format parsing falls back to when the input names none.
    pub timezone: Tz,
    /// Week start for relative period expressions.
    pub week_start: WeekStartDay,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            week_start: WeekStartDay::Monday,
        }
    }
}

impl FactoryConfig {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            ..Default::default()
        }
    }

    /// Replace the timezone by IANA name.
    ///
    /// # Errors
    ///
    /// Returns [`DateError::InvalidTimezone`] if the name is not a known IANA zone.
    pub fn with_timezone_name(mut self, name: &str) -> Result<Self, DateError> {
        self.timezone = parse_timezone(name)?;
        Ok(self)
    }

    pub fn with_week_start(mut self, week_start: WeekStartDay) -> Self {
        self.week_start = week_start;
        self
    }

    /// Build a configuration from `DATEFORGE_TIMEZONE`, then `TZ`.
    ///
    /// Missing or unrecognised values fall back to UTC.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// The process-wide default, read from the environment on first use.
    pub fn global() -> &'static FactoryConfig {
        static GLOBAL: OnceLock<FactoryConfig> = OnceLock::new();
        GLOBAL.get_or_init(FactoryConfig::from_env)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        for key in [TIMEZONE_ENV, TZ_ENV] {
            let Some(raw) = lookup(key) else {
                continue;
            };
            let name = timezone_name_from_env(&raw);
            if name.is_empty() {
                continue;
            }
            match parse_timezone(name) {
                Ok(tz) => {
                    debug!(variable = key, timezone = %tz.name(), "default timezone from environment");
                    return Self::new(tz);
                }
                Err(_) => {
                    warn!(variable = key, value = %raw, "unrecognised timezone, ignoring");
                }
            }
        }
        Self::default()
    }
}

/// Parse an IANA timezone string into `Tz`.
pub fn parse_timezone(s: &str) -> Result<Tz, DateError> {
    s.trim()
        .parse::<Tz>()
        .map_err(|_| DateError::InvalidTimezone(format!("'{}'", s)))
}

/// `TZ` may be `:Europe/Paris` or a path into a zoneinfo tree.
fn timezone_name_from_env(raw: &str) -> &str {
    let value = raw.trim().trim_start_matches(':');
    match value.find("zoneinfo/") {
        Some(idx) => &value[idx + "zoneinfo/".len()..],
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_is_utc_monday() {
        let config = FactoryConfig::default();
        assert_eq!(config.timezone, Tz::UTC);
        assert_eq!(config.week_start, WeekStartDay::Monday);
    }

    #[test]
    fn test_dedicated_variable_wins_over_tz() {
        let config = FactoryConfig::from_lookup(lookup_from(&[
            (TIMEZONE_ENV, "Asia/Tokyo"),
            (TZ_ENV, "Europe/London"),
        ]));
        assert_eq!(config.timezone, chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn test_tz_variable_forms() {
        let config = FactoryConfig::from_lookup(lookup_from(&[(TZ_ENV, ":Europe/Paris")]));
        assert_eq!(config.timezone, chrono_tz::Europe::Paris);

        let config = FactoryConfig::from_lookup(lookup_from(&[(
            TZ_ENV,
            "/usr/share/zoneinfo/America/New_York",
        )]));
        assert_eq!(config.timezone, chrono_tz::America::New_York);
    }

    #[test]
    fn test_invalid_value_falls_through() {
        let config = FactoryConfig::from_lookup(lookup_from(&[
            (TIMEZONE_ENV, "Not/AZone"),
            (TZ_ENV, "Australia/Sydney"),
        ]));
        assert_eq!(config.timezone, chrono_tz::Australia::Sydney);

        let config = FactoryConfig::from_lookup(lookup_from(&[(TZ_ENV, "garbage")]));
        assert_eq!(config.timezone, Tz::UTC);
    }

    #[test]
    fn test_with_timezone_name() {
        let config = FactoryConfig::default()
            .with_timezone_name("America/Chicago")
            .unwrap();
        assert_eq!(config.timezone, chrono_tz::America::Chicago);

        let err = FactoryConfig::default()
            .with_timezone_name("Invalid/Zone")
            .unwrap_err()
            .to_string();
        assert!(err.contains("Invalid timezone"), "got: {err}");
    }

    #[test]
    fn test_week_start_offsets() {
        assert_eq!(WeekStartDay::Monday.days_from_start(Weekday::Mon), 0);
        assert_eq!(WeekStartDay::Monday.days_from_start(Weekday::Sun), 6);
        assert_eq!(WeekStartDay::Sunday.days_from_start(Weekday::Sun), 0);
        assert_eq!(WeekStartDay::Sunday.days_from_start(Weekday::Sat), 6);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: FactoryConfig =
            serde_json::from_str(r#"{"week_start":"sunday"}"#).unwrap();
        assert_eq!(config.timezone, Tz::UTC);
        assert_eq!(config.week_start, WeekStartDay::Sunday);

        let config: FactoryConfig =
            serde_json::from_str(r#"{"timezone":"Europe/Berlin"}"#).unwrap();
        assert_eq!(config.timezone, chrono_tz::Europe::Berlin);
    }
}
