/// Local wall-clock access
///
/// Every DateKey the cache derives comes through a Clock, so tests can pin
/// "today" and step across midnight without waiting for it.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};

use crate::domain::DateKey;

/// Source of the local wall-clock time
pub trait Clock: Send + Sync {
    /// Current local date and time (no time zone attached)
    fn now(&self) -> NaiveDateTime;

    /// Today's key in the local calendar
    fn today(&self) -> DateKey {
        DateKey::new(self.now().date())
    }

    /// Time left until the next local midnight
    fn until_next_midnight(&self) -> Duration {
        let now = self.now();
        let next_midnight = (now.date() + chrono::Duration::days(1)).and_hms_opt(0, 0, 0);

        match next_midnight {
            Some(midnight) => (midnight - now).to_std().unwrap_or(Duration::ZERO),
            None => Duration::ZERO,
        }
    }
}

/// Clock backed by the operating system's local time zone
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Clock set to noon on the given day
    pub fn at_noon(day: DateKey) -> Self {
        let noon = day
            .date()
            .and_hms_opt(12, 0, 0)
            .unwrap_or_else(|| day.date().and_time(chrono::NaiveTime::MIN));
        Self::new(noon)
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_manual_clock_today_and_midnight() {
        let clock = ManualClock::new(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(23, 59, 0).unwrap(),
        );

        assert_eq!(clock.today().to_string(), "2024-06-01");
        assert_eq!(clock.until_next_midnight(), Duration::from_secs(60));

        clock.advance(chrono::Duration::minutes(2));
        assert_eq!(clock.today().to_string(), "2024-06-02");
        assert_eq!(clock.until_next_midnight(), Duration::from_secs(24 * 3600 - 60));
    }

    #[test]
    fn test_at_noon() {
        let day = DateKey::from_ymd(2024, 3, 10).unwrap();
        let clock = ManualClock::at_noon(day);
        assert_eq!(clock.today(), day);
        assert_eq!(clock.until_next_midnight(), Duration::from_secs(12 * 3600));
    }
}
