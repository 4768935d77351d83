use serde::Serialize;
use time::Date;

use super::window::days_between;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
    pub consecutive_days: u32,
    pub current_streak: bool,
}

/// Counts consecutive calendar days ending `today`.
///
/// Days may arrive in any order and contain duplicates. If the most recent
/// day is not `today` there is no current streak.
pub fn streak_ending<I>(days: I, today: Date) -> Streak
where
    I: IntoIterator<Item = Date>,
{
    let mut days: Vec<Date> = days.into_iter().collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let Some((&latest, rest)) = days.split_first() else {
        return Streak::default();
    };
    if latest != today {
        return Streak::default();
    }

    let mut count = 1;
    let mut previous = latest;
    for &day in rest {
        if days_between(previous, day) != 1 {
            break;
        }
        count += 1;
        previous = day;
    }

    Streak {
        consecutive_days: count,
        current_streak: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn breaks_at_first_gap() {
        let days = [date!(2024-03-05), date!(2024-03-04), date!(2024-03-03), date!(2024-03-01)];
        let s = streak_ending(days, date!(2024-03-05));
        assert_eq!(s.consecutive_days, 3);
        assert!(s.current_streak);
    }

    #[test]
    fn no_streak_when_latest_is_not_today() {
        let days = [date!(2024-03-04), date!(2024-03-03)];
        assert_eq!(streak_ending(days, date!(2024-03-05)), Streak::default());
    }

    #[test]
    fn empty_input_has_no_streak() {
        assert_eq!(streak_ending([], date!(2024-03-05)), Streak::default());
    }

    #[test]
    fn unsorted_and_duplicate_days_are_normalised() {
        let days = [date!(2024-03-04), date!(2024-03-05), date!(2024-03-05), date!(2024-03-03)];
        let s = streak_ending(days, date!(2024-03-05));
        assert_eq!(s.consecutive_days, 3);
    }

    #[test]
    fn crosses_month_and_leap_day_boundaries() {
        let days = [date!(2024-03-01), date!(2024-02-29), date!(2024-02-28)];
        assert_eq!(streak_ending(days, date!(2024-03-01)).consecutive_days, 3);
    }

    #[test]
    fn single_day_today() {
        let s = streak_ending([date!(2024-03-05)], date!(2024-03-05));
        assert_eq!(s, Streak { consecutive_days: 1, current_streak: true });
    }
}
