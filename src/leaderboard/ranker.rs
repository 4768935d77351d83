//! Ranks the people who log consumptions for the tracked user.
//!
//! Ranking is by total contributions, highest first. Ties keep the order in
//! which contributors first appear in the input, so feeding contributions
//! oldest first ranks the earliest contributor ahead.

use serde::Serialize;
use time::{OffsetDateTime, UtcOffset};
use uuid::Uuid;

use crate::aggregation::{
    streak::streak_ending,
    window::{local_date, Window},
};
use crate::consumptions::repo_types::Contribution;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Badges {
    pub monthly_contributions: u32,
    pub streak_days: u32,
    pub is_first_today: bool,
    pub is_top_monthly: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedContributor {
    pub user_id: Uuid,
    pub username: String,
    pub total_contributions: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub last_contribution: OffsetDateTime,
    pub badges: Badges,
}

struct Tally {
    user_id: Uuid,
    username: String,
    total: u32,
    monthly: u32,
    last: OffsetDateTime,
    times: Vec<OffsetDateTime>,
}

pub fn rank(contributions: &[Contribution], now: OffsetDateTime, offset: UtcOffset) -> Vec<RankedContributor> {
    let month = Window::calendar_month(now, offset);
    let today = local_date(now, offset);

    let mut tallies: Vec<Tally> = Vec::new();
    for c in contributions {
        let idx = match tallies.iter().position(|t| t.user_id == c.contributor_id) {
            Some(i) => i,
            None => {
                tallies.push(Tally {
                    user_id: c.contributor_id,
                    username: c.contributor_username.clone(),
                    total: 0,
                    monthly: 0,
                    last: c.created_at,
                    times: Vec::new(),
                });
                tallies.len() - 1
            }
        };
        let t = &mut tallies[idx];
        t.total += 1;
        if month.contains(c.created_at) {
            t.monthly += 1;
        }
        if c.created_at > t.last {
            t.last = c.created_at;
        }
        t.times.push(c.created_at);
    }

    let mut ranked: Vec<RankedContributor> = tallies
        .into_iter()
        .map(|t| {
            let days: Vec<_> = t.times.iter().map(|at| local_date(*at, offset)).collect();
            let contributed_today = days.contains(&today);
            let streak = streak_ending(days, today);
            RankedContributor {
                user_id: t.user_id,
                username: t.username,
                total_contributions: t.total,
                last_contribution: t.last,
                badges: Badges {
                    monthly_contributions: t.monthly,
                    streak_days: streak.consecutive_days,
                    is_first_today: contributed_today,
                    is_top_monthly: false,
                },
            }
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.total_contributions.cmp(&a.total_contributions));

    if let Some(best) = ranked.iter().map(|r| r.badges.monthly_contributions).max() {
        if let Some(top) = ranked
            .iter_mut()
            .find(|r| r.badges.monthly_contributions == best)
        {
            top.badges.is_top_monthly = true;
        }
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn contribution(user: Uuid, name: &str, at: OffsetDateTime) -> Contribution {
        Contribution {
            contributor_id: user,
            contributor_username: name.to_string(),
            created_at: at,
        }
    }

    const NOW: OffsetDateTime = datetime!(2024-03-20 18:00 UTC);

    #[test]
    fn ranks_by_total_and_marks_one_top_monthly() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut input = Vec::new();
        for day in 1..=5u8 {
            input.push(contribution(a, "alice", datetime!(2024-03-01 10:00 UTC).replace_day(day).unwrap()));
        }
        for day in 10..=12u8 {
            input.push(contribution(b, "bob", datetime!(2024-03-01 10:00 UTC).replace_day(day).unwrap()));
        }
        // b first in encounter order must not matter when totals differ
        input.rotate_left(5);

        let ranked = rank(&input, NOW, UtcOffset::UTC);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].username, "alice");
        assert_eq!(ranked[0].total_contributions, 5);
        assert_eq!(ranked[0].badges.monthly_contributions, 5);
        assert!(ranked[0].badges.is_top_monthly);
        assert!(!ranked[1].badges.is_top_monthly);
        assert_eq!(ranked[0].last_contribution, datetime!(2024-03-05 10:00 UTC));
    }

    #[test]
    fn ties_keep_encounter_order() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let input = [
            contribution(b, "bob", datetime!(2024-03-02 10:00 UTC)),
            contribution(a, "alice", datetime!(2024-03-03 10:00 UTC)),
            contribution(b, "bob", datetime!(2024-03-04 10:00 UTC)),
            contribution(a, "alice", datetime!(2024-03-05 10:00 UTC)),
        ];
        let ranked = rank(&input, NOW, UtcOffset::UTC);
        assert_eq!(ranked[0].username, "bob");
        assert_eq!(ranked[1].username, "alice");
        assert_eq!(ranked.iter().filter(|r| r.badges.is_top_monthly).count(), 1);
        assert!(ranked[0].badges.is_top_monthly);
    }

    #[test]
    fn top_monthly_ignores_earlier_months() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let input = [
            contribution(a, "alice", datetime!(2024-02-10 10:00 UTC)),
            contribution(a, "alice", datetime!(2024-02-11 10:00 UTC)),
            contribution(a, "alice", datetime!(2024-02-12 10:00 UTC)),
            contribution(b, "bob", datetime!(2024-03-19 10:00 UTC)),
        ];
        let ranked = rank(&input, NOW, UtcOffset::UTC);
        assert_eq!(ranked[0].username, "alice");
        assert_eq!(ranked[0].badges.monthly_contributions, 0);
        assert!(!ranked[0].badges.is_top_monthly);
        assert!(ranked[1].badges.is_top_monthly);
    }

    #[test]
    fn streak_and_today_badges() {
        let a = Uuid::new_v4();
        let input = [
            contribution(a, "alice", datetime!(2024-03-17 09:00 UTC)),
            contribution(a, "alice", datetime!(2024-03-18 09:00 UTC)),
            contribution(a, "alice", datetime!(2024-03-19 09:00 UTC)),
            contribution(a, "alice", datetime!(2024-03-20 08:00 UTC)),
            contribution(a, "alice", datetime!(2024-03-20 09:00 UTC)),
        ];
        let ranked = rank(&input, NOW, UtcOffset::UTC);
        assert_eq!(ranked[0].badges.streak_days, 4);
        assert!(ranked[0].badges.is_first_today);

        let stale = [contribution(a, "alice", datetime!(2024-03-19 09:00 UTC))];
        let ranked = rank(&stale, NOW, UtcOffset::UTC);
        assert_eq!(ranked[0].badges.streak_days, 0);
        assert!(!ranked[0].badges.is_first_today);
    }

    #[test]
    fn empty_input_gives_empty_ranking() {
        assert!(rank(&[], NOW, UtcOffset::UTC).is_empty());
    }
}
