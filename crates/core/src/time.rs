use chrono::{DateTime, Days, NaiveDate, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: chrono::Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

//
// ─── CALENDAR DAYS ─────────────────────────────────────────────────────────────
//

/// Calendar day (UTC) a timestamp falls on.
#[must_use]
pub fn calendar_day(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}

/// Whole calendar days from `from` to `to`, ignoring time of day.
///
/// Negative when `to` falls on an earlier day than `from`.
///
/// ```
/// # use lesson_core::time::{days_between, fixed_now};
/// let now = fixed_now();
/// assert_eq!(days_between(now, now + chrono::Duration::days(2)), 2);
/// assert_eq!(days_between(now, now), 0);
/// ```
#[must_use]
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    calendar_day(to)
        .signed_duration_since(calendar_day(from))
        .num_days()
}

/// Adds whole calendar days, keeping the time of day.
///
/// Saturates at `DateTime::<Utc>::MAX_UTC` instead of overflowing.
#[must_use]
pub fn add_days(at: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    at.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn days_between_ignores_time_of_day() {
        // 22:13 -> 01:13 the next day is one calendar day, not zero.
        let late = fixed_now();
        let early_next_day = late + Duration::hours(3);
        assert_eq!(days_between(late, early_next_day), 1);

        let later_same_day = late + Duration::minutes(30);
        assert_eq!(days_between(late, later_same_day), 0);
        assert_eq!(days_between(early_next_day, late), -1);
    }

    #[test]
    fn add_days_keeps_time_of_day() {
        let now = fixed_now();
        let next = add_days(now, 3);
        assert_eq!(next - now, Duration::days(3));
        assert_eq!(next.time(), now.time());
    }

    #[test]
    fn fixed_clock_advances() {
        let mut clock = fixed_clock();
        clock.advance(Duration::days(1));
        assert_eq!(clock.now(), fixed_now() + Duration::days(1));

        let mut real = Clock::default_clock();
        real.advance(Duration::days(1));
        assert!(matches!(real, Clock::Default));
    }
}
