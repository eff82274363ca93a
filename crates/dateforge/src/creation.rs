//! Shorthand access to the factory.
//!
//! Free functions go through the process-wide [`default_factory`]. Types that
//! build dates implement [`DateTimeCreation`] to get the same two operations
//! as methods, and can override [`DateTimeCreation::date_time_factory`] to
//! supply their own factory (a test double, a differently configured one).

use crate::error::Result;
use crate::factory::{default_factory, DateInput, DateTimeFactory};
use crate::value::{ImmutableDateTime, MutableDateTime};

pub fn to_date_time(from: impl Into<DateInput>, format: Option<&str>) -> Result<MutableDateTime> {
    default_factory().create_date_time(from.into(), format)
}

pub fn to_date_time_immutable(
    from: impl Into<DateInput>,
    format: Option<&str>,
) -> Result<ImmutableDateTime> {
    default_factory().create_date_time_immutable(from.into(), format)
}

pub trait DateTimeCreation {
    /// The factory the other methods forward to.
    fn date_time_factory(&self) -> &dyn DateTimeFactory {
        default_factory()
    }

    fn to_date_time(&self, from: impl Into<DateInput>, format: Option<&str>) -> Result<MutableDateTime>
    where
        Self: Sized,
    {
        self.date_time_factory().create_date_time(from.into(), format)
    }

    fn to_date_time_immutable(
        &self,
        from: impl Into<DateInput>,
        format: Option<&str>,
    ) -> Result<ImmutableDateTime>
    where
        Self: Sized,
    {
        self.date_time_factory()
            .create_date_time_immutable(from.into(), format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::FactoryConfig;
    use crate::error::DateError;
    use crate::factory::StandardDateTimeFactory;
    use crate::value::DateTimeLike;
    use chrono::{TimeZone, Utc};

    struct Report {
        factory: StandardDateTimeFactory<FixedClock>,
    }

    impl Report {
        fn new() -> Self {
            let now = Utc.with_ymd_and_hms(2026, 2, 18, 14, 30, 0).unwrap();
            Self {
                factory: StandardDateTimeFactory::with_clock(
                    FactoryConfig::new(chrono_tz::Asia::Tokyo),
                    FixedClock::new(now),
                ),
            }
        }
    }

    impl DateTimeCreation for Report {
        fn date_time_factory(&self) -> &dyn DateTimeFactory {
            &self.factory
        }
    }

    struct Plain;

    impl DateTimeCreation for Plain {}

    #[test]
    fn test_instance_form_uses_injected_factory() {
        let report = Report::new();
        let value = report.to_date_time("tomorrow", None).unwrap();
        assert_eq!(value.format("Y-m-d H:i e"), "2026-02-19 00:00 Asia/Tokyo");
        let snapshot = report.to_date_time_immutable(0_i64, None).unwrap();
        assert_eq!(snapshot.format("Y-m-d H:i"), "1970-01-01 09:00");
    }

    #[test]
    fn test_instance_form_propagates_errors() {
        let err = Report::new()
            .to_date_time("2023-13-05", Some("Y-m-d"))
            .unwrap_err();
        assert!(matches!(err, DateError::InvalidArgument(_)));
    }

    #[test]
    fn test_default_accessor_and_free_functions_agree() {
        let via_trait = Plain.to_date_time(1_700_000_000_i64, None).unwrap();
        let via_fn = to_date_time(1_700_000_000_i64, None).unwrap();
        assert_eq!(via_trait, via_fn);
        let immutable = to_date_time_immutable("@86400", None).unwrap();
        assert_eq!(immutable.timestamp(), 86_400);
    }
}
