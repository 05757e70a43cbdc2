use std::collections::HashSet;

use chrono::{Duration, NaiveDate};

/// Consecutive days with a logged entry, ending today. A day without data
/// breaks the chain; no entry for today means no streak at all.
pub fn current_streak(entry_dates: &[NaiveDate], today: NaiveDate) -> i32 {
    let dates: HashSet<NaiveDate> = entry_dates.iter().copied().collect();
    if !dates.contains(&today) {
        return 0;
    }

    let mut streak = 1;
    let mut day = today - Duration::days(1);
    while dates.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

/// Streak milestones that earn a reward. Returns every milestone at or below
/// the given streak; the grant itself is idempotent, so re-reporting an
/// already-earned milestone is harmless.
pub fn milestones_reached(streak: i32) -> Vec<StreakMilestone> {
    MILESTONES
        .iter()
        .filter(|m| streak >= m.days)
        .copied()
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct StreakMilestone {
    pub days: i32,
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

const MILESTONES: &[StreakMilestone] = &[
    StreakMilestone {
        days: 3,
        code: "streak_3",
        name: "Getting Started",
        description: "Logged wellness data 3 days in a row",
        icon: "seedling",
    },
    StreakMilestone {
        days: 7,
        code: "streak_7",
        name: "One Week Strong",
        description: "Logged wellness data 7 days in a row",
        icon: "flame",
    },
    StreakMilestone {
        days: 30,
        code: "streak_30",
        name: "Habit Formed",
        description: "Logged wellness data 30 days in a row",
        icon: "trophy",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn no_entry_today_means_no_streak() {
        assert_eq!(current_streak(&[d(8), d(9)], d(10)), 0);
    }

    #[test]
    fn counts_consecutive_days_ending_today() {
        assert_eq!(current_streak(&[d(8), d(9), d(10)], d(10)), 3);
    }

    #[test]
    fn gap_breaks_the_chain() {
        assert_eq!(current_streak(&[d(6), d(7), d(9), d(10)], d(10)), 2);
    }

    #[test]
    fn single_day_streak() {
        assert_eq!(current_streak(&[d(10)], d(10)), 1);
    }

    #[test]
    fn milestones_accumulate() {
        assert!(milestones_reached(2).is_empty());
        assert_eq!(milestones_reached(3).len(), 1);
        let week = milestones_reached(8);
        assert_eq!(week.len(), 2);
        assert_eq!(week[1].code, "streak_7");
    }
}
