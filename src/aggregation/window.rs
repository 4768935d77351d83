//! Calendar windows in a fixed reference offset.
//!
//! Every date boundary is computed on `time::Date` values in the configured
//! offset, so day arithmetic never depends on elapsed hours.

use serde::Deserialize;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

/// Longest look-back a caller may ask for, in days.
pub const MAX_LOOKBACK_DAYS: u32 = 3660;

/// Time range over which consumptions are summed.
///
/// The start is always inclusive. The end is exclusive for full calendar
/// periods and inclusive for periods that run up to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
    pub end_inclusive: bool,
}

impl Window {
    pub fn half_open(start: OffsetDateTime, end: OffsetDateTime) -> Self {
        Self {
            start,
            end,
            end_inclusive: false,
        }
    }

    pub fn up_to(start: OffsetDateTime, now: OffsetDateTime) -> Self {
        Self {
            start,
            end: now,
            end_inclusive: true,
        }
    }

    pub fn contains(&self, at: OffsetDateTime) -> bool {
        if at < self.start {
            return false;
        }
        if self.end_inclusive {
            at <= self.end
        } else {
            at < self.end
        }
    }

    /// Exclusive upper bound suitable for a `created_at < $end` query.
    /// timestamptz has microsecond resolution.
    pub fn fetch_end(&self) -> OffsetDateTime {
        if self.end_inclusive {
            self.end + Duration::microseconds(1)
        } else {
            self.end
        }
    }

    /// A finished calendar day: [midnight, next midnight).
    pub fn day(date: Date, offset: UtcOffset) -> Self {
        Self::half_open(midnight(date, offset), midnight(date.next_day().unwrap_or(date), offset))
    }

    /// The current day, open at the top: [midnight today, now].
    pub fn today(now: OffsetDateTime, offset: UtcOffset) -> Self {
        Self::up_to(midnight(local_date(now, offset), offset), now)
    }

    /// [midnight `days` days ago, now].
    pub fn last_days(now: OffsetDateTime, offset: UtcOffset, days: u32) -> Self {
        let start = days_before(local_date(now, offset), days);
        Self::up_to(midnight(start, offset), now)
    }

    /// [most recent Sunday midnight, now]. On a Sunday the week starts today.
    pub fn this_week(now: OffsetDateTime, offset: UtcOffset) -> Self {
        Self::up_to(midnight(week_start(local_date(now, offset)), offset), now)
    }

    /// [first-of-month midnight, now].
    pub fn this_month(now: OffsetDateTime, offset: UtcOffset) -> Self {
        Self::up_to(midnight(month_start(local_date(now, offset)), offset), now)
    }

    /// The whole current month: [first of month, first of next month).
    pub fn calendar_month(now: OffsetDateTime, offset: UtcOffset) -> Self {
        let first = month_start(local_date(now, offset));
        let next = first + Duration::days(i64::from(days_in_month(first)));
        Self::half_open(midnight(first, offset), midnight(next, offset))
    }
}

/// Reporting period requested by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    Today,
    LastDays,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Today,
    LastDays(u32),
    Week,
    Month,
}

impl Period {
    pub fn new(kind: PeriodKind, days: Option<u32>) -> Self {
        match kind {
            PeriodKind::Today => Period::Today,
            PeriodKind::LastDays => {
                Period::LastDays(days.unwrap_or(3).clamp(1, MAX_LOOKBACK_DAYS))
            }
            PeriodKind::Week => Period::Week,
            PeriodKind::Month => Period::Month,
        }
    }

    pub fn window(&self, now: OffsetDateTime, offset: UtcOffset) -> Window {
        match *self {
            Period::Today => Window::today(now, offset),
            Period::LastDays(n) => Window::last_days(now, offset, n),
            Period::Week => Window::this_week(now, offset),
            Period::Month => Window::this_month(now, offset),
        }
    }

    /// Number of days the period's limits are scaled by.
    pub fn days(&self, now: OffsetDateTime, offset: UtcOffset) -> u32 {
        match *self {
            Period::Today => 1,
            Period::LastDays(n) => n,
            Period::Week => 7,
            Period::Month => u32::from(days_in_month(local_date(now, offset))),
        }
    }
}

pub fn local_date(at: OffsetDateTime, offset: UtcOffset) -> Date {
    at.to_offset(offset).date()
}

pub fn midnight(date: Date, offset: UtcOffset) -> OffsetDateTime {
    date.midnight().assume_offset(offset)
}

pub fn week_start(date: Date) -> Date {
    date - Duration::days(i64::from(date.weekday().number_days_from_sunday()))
}

pub fn month_start(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

pub fn days_in_month(date: Date) -> u8 {
    date.month().length(date.year())
}

/// `date` minus `days`, capped at [`MAX_LOOKBACK_DAYS`].
pub fn days_before(date: Date, days: u32) -> Date {
    let days = days.min(MAX_LOOKBACK_DAYS);
    date.checked_sub(Duration::days(i64::from(days)))
        .unwrap_or(Date::MIN)
}

/// Whole calendar days from `earlier` to `later`.
pub fn days_between(later: Date, earlier: Date) -> i64 {
    (later - earlier).whole_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, offset};

    #[test]
    fn today_is_open_up_to_now() {
        let now = datetime!(2024-03-05 14:30 UTC);
        let w = Window::today(now, UtcOffset::UTC);
        assert_eq!(w.start, datetime!(2024-03-05 00:00 UTC));
        assert!(w.contains(now));
        assert!(!w.contains(now + Duration::SECOND));
        assert!(!w.contains(datetime!(2024-03-04 23:59:59 UTC)));
    }

    #[test]
    fn historical_day_excludes_next_midnight() {
        let w = Window::day(date!(2024-03-04), UtcOffset::UTC);
        assert!(w.contains(datetime!(2024-03-04 00:00 UTC)));
        assert!(w.contains(datetime!(2024-03-04 23:59:59 UTC)));
        assert!(!w.contains(datetime!(2024-03-05 00:00 UTC)));
    }

    #[test]
    fn today_follows_the_reference_offset() {
        // 23:30 UTC on the 4th is already the 5th in +02:00.
        let now = datetime!(2024-03-04 23:30 UTC);
        let w = Window::today(now, offset!(+2));
        assert_eq!(w.start, datetime!(2024-03-05 00:00 +2));
    }

    #[test]
    fn week_starts_on_most_recent_sunday() {
        // 2024-03-06 is a Wednesday.
        let w = Window::this_week(datetime!(2024-03-06 10:00 UTC), UtcOffset::UTC);
        assert_eq!(w.start, datetime!(2024-03-03 00:00 UTC));

        // On a Sunday the week starts the same day.
        let w = Window::this_week(datetime!(2024-03-03 10:00 UTC), UtcOffset::UTC);
        assert_eq!(w.start, datetime!(2024-03-03 00:00 UTC));
    }

    #[test]
    fn month_windows() {
        let now = datetime!(2023-02-17 08:00 UTC);
        let open = Window::this_month(now, UtcOffset::UTC);
        assert_eq!(open.start, datetime!(2023-02-01 00:00 UTC));
        assert_eq!(open.end, now);

        let full = Window::calendar_month(now, UtcOffset::UTC);
        assert_eq!(full.end, datetime!(2023-03-01 00:00 UTC));
        assert!(!full.end_inclusive);
    }

    #[test]
    fn last_days_starts_at_midnight_n_days_ago() {
        let w = Window::last_days(datetime!(2024-03-05 09:00 UTC), UtcOffset::UTC, 3);
        assert_eq!(w.start, datetime!(2024-03-02 00:00 UTC));
    }

    #[test]
    fn huge_look_back_is_capped() {
        let now = datetime!(2024-03-05 12:00 UTC);
        let period = Period::new(PeriodKind::LastDays, Some(u32::MAX));
        assert_eq!(period, Period::LastDays(MAX_LOOKBACK_DAYS));
        assert_eq!(period.days(now, UtcOffset::UTC), MAX_LOOKBACK_DAYS);

        let w = period.window(now, UtcOffset::UTC);
        assert_eq!(w.start.date(), date!(2024-03-05) - Duration::days(3660));

        let w = Window::last_days(now, UtcOffset::UTC, u32::MAX);
        assert_eq!(w.start.date(), date!(2024-03-05) - Duration::days(3660));
        assert_eq!(days_before(date!(2024-03-05), u32::MAX), date!(2014-02-26));
    }

    #[test]
    fn period_day_counts() {
        let feb = datetime!(2023-02-10 12:00 UTC);
        assert_eq!(Period::Month.days(feb, UtcOffset::UTC), 28);
        assert_eq!(Period::Month.days(datetime!(2024-02-10 12:00 UTC), UtcOffset::UTC), 29);
        assert_eq!(Period::Week.days(feb, UtcOffset::UTC), 7);
        assert_eq!(Period::new(PeriodKind::LastDays, None).days(feb, UtcOffset::UTC), 3);
        assert_eq!(Period::Today.days(feb, UtcOffset::UTC), 1);
    }

    #[test]
    fn fetch_end_covers_inclusive_now() {
        let now = datetime!(2024-03-05 14:30 UTC);
        let w = Window::today(now, UtcOffset::UTC);
        assert!(w.fetch_end() > now);
        let d = Window::day(date!(2024-03-05), UtcOffset::UTC);
        assert_eq!(d.fetch_end(), d.end);
    }

    #[test]
    fn day_difference_is_calendar_based() {
        assert_eq!(days_between(date!(2024-03-31), date!(2024-03-30)), 1);
        assert_eq!(days_between(date!(2024-03-01), date!(2024-02-28)), 2);
    }
}
