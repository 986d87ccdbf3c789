use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

/// Single source of "now" and "today" in the local zone.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(utc_offset_hours: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix());
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Pinned clock for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn at(date: NaiveDate) -> Self {
        Self {
            now: DateTime::from_naive_utc_and_offset(date.and_time(NaiveTime::MIN), Utc.fix()),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_today() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        assert_eq!(FixedClock::at(date).today(), date);
    }

    #[test]
    fn test_system_clock_invalid_offset_falls_back_to_utc() {
        let clock = SystemClock::new(99);
        assert_eq!(clock.now().offset().local_minus_utc(), 0);
    }
}
