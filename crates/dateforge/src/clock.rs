//! Sources of "now".
//!
//! Parsing fills unspecified fields from the current time and relative
//! expressions are resolved against it, so every component that needs the
//! current instant takes a [`Clock`] instead of reading the system time
//! directly. Production code uses [`SystemClock`]; tests pin time with
//! [`FixedClock`].

use chrono::{DateTime, Utc};

/// Provides the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the OS clock via `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_is_stable() {
        let instant = Utc.with_ymd_and_hms(2026, 2, 18, 14, 30, 0).unwrap();
        let clock = FixedClock::new(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_clock_by_reference() {
        let instant = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let clock = FixedClock(instant);
        fn read(c: impl Clock) -> DateTime<Utc> {
            c.now()
        }
        assert_eq!(read(&clock), instant);
    }
}
