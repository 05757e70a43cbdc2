//! Injected time source. Handlers and the sync reconciler take the clock from
//! `AppState` instead of calling `Utc::now()` inline, so "yesterday" is
//! pinnable in tests.

use chrono::{DateTime, Duration, NaiveDate, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    fn yesterday(&self) -> NaiveDate {
        self.today() - Duration::days(1)
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed-instant clock for tests.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn yesterday_is_previous_calendar_day() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 2, 0, 30, 0).unwrap());
        assert_eq!(
            clock.yesterday(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }
}
