//! Rolling statistics over a window of entries. Pure functions — callers
//! fetch the window and targets, this module only aggregates.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::entry::WellnessEntry;
use crate::models::goal::{GoalPeriod, GoalType, WellnessGoal};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStats {
    pub average_steps: i64,
    pub average_sleep: f64,
    pub average_study: f64,
    pub average_stress: f64,
    pub average_water: f64,
    pub exercise_days: i64,
    pub mood_distribution: BTreeMap<String, i64>,
    pub goal_progress: GoalProgress,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct GoalProgress {
    pub steps: i64,
    pub sleep: i64,
    pub study: i64,
    pub water: i64,
}

impl PeriodStats {
    /// Zero-length windows yield all-zero stats rather than dividing by zero.
    pub fn empty() -> Self {
        Self {
            average_steps: 0,
            average_sleep: 0.0,
            average_study: 0.0,
            average_stress: 0.0,
            average_water: 0.0,
            exercise_days: 0,
            mood_distribution: BTreeMap::new(),
            goal_progress: GoalProgress::default(),
        }
    }
}

/// Per-metric daily targets used for goal-progress percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalTargets {
    pub daily_steps: f64,
    pub sleep_hours: f64,
    pub study_hours: f64,
    pub water_intake: f64,
}

impl Default for GoalTargets {
    fn default() -> Self {
        Self {
            daily_steps: 10000.0,
            sleep_hours: 8.0,
            study_hours: 6.0,
            water_intake: 2.5,
        }
    }
}

impl GoalTargets {
    /// Overlay the defaults with the user's active daily goals.
    pub fn from_active_goals(goals: &[WellnessGoal]) -> Self {
        let mut targets = Self::default();
        for goal in goals {
            if !goal.is_active || goal.period != GoalPeriod::Daily {
                continue;
            }
            match goal.goal_type {
                GoalType::Steps => targets.daily_steps = goal.target,
                GoalType::Sleep => targets.sleep_hours = goal.target,
                GoalType::Study => targets.study_hours = goal.target,
                GoalType::Water => targets.water_intake = goal.target,
                GoalType::Exercise | GoalType::Stress => {}
            }
        }
        targets
    }
}

pub fn compute_stats(entries: &[WellnessEntry], targets: &GoalTargets) -> PeriodStats {
    if entries.is_empty() {
        return PeriodStats::empty();
    }

    let n = entries.len() as f64;

    let average_steps = (entries.iter().map(|e| f64::from(e.steps)).sum::<f64>() / n).round() as i64;
    let average_sleep = round1(
        entries
            .iter()
            .map(|e| e.sleep_hours.unwrap_or(0.0))
            .sum::<f64>()
            / n,
    );
    let average_study = round1(
        entries
            .iter()
            .map(|e| e.study_hours.unwrap_or(0.0))
            .sum::<f64>()
            / n,
    );
    // Missing stress reads as neutral (5), not as zero.
    let average_stress = round1(
        entries
            .iter()
            .map(|e| f64::from(e.stress_level.unwrap_or(5)))
            .sum::<f64>()
            / n,
    );
    let average_water = round1(entries.iter().map(|e| e.diet.water_intake).sum::<f64>() / n);

    let exercise_days = entries.iter().filter(|e| e.activity.exercise).count() as i64;

    let mut mood_distribution = BTreeMap::new();
    for entry in entries {
        *mood_distribution
            .entry(entry.mood.as_str().to_string())
            .or_insert(0) += 1;
    }

    // Percentages come off the already-rounded averages and are deliberately
    // uncapped: 150% goal completion is representable.
    let goal_progress = GoalProgress {
        steps: progress(average_steps as f64, targets.daily_steps),
        sleep: progress(average_sleep, targets.sleep_hours),
        study: progress(average_study, targets.study_hours),
        water: progress(average_water, targets.water_intake),
    };

    PeriodStats {
        average_steps,
        average_sleep,
        average_study,
        average_stress,
        average_water,
        exercise_days,
        mood_distribution,
        goal_progress,
    }
}

fn progress(average: f64, target: f64) -> i64 {
    if target <= 0.0 {
        return 0;
    }
    (average / target * 100.0).round() as i64
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::{Activity, Diet, Mood, Source, WellnessEntry};
    use chrono::{NaiveDate, Utc};
    use sqlx::types::Json;
    use uuid::Uuid;

    fn entry(steps: i32) -> WellnessEntry {
        WellnessEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            steps,
            heart_rate: None,
            sleep_hours: None,
            study_hours: None,
            stress_level: None,
            mood: Mood::Okay,
            diet: Json(Diet::default()),
            activity: Json(Activity::default()),
            notes: None,
            source: Source::Manual,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn empty_window_yields_zero_stats() {
        let stats = compute_stats(&[], &GoalTargets::default());
        assert_eq!(stats, PeriodStats::empty());
        assert!(stats.mood_distribution.is_empty());
    }

    #[test]
    fn average_steps_is_rounded_mean() {
        let entries = vec![entry(1000), entry(2001)];
        let stats = compute_stats(&entries, &GoalTargets::default());
        assert_eq!(stats.average_steps, 1501); // 1500.5 rounds up
    }

    #[test]
    fn missing_stress_defaults_to_five() {
        let mut high = entry(0);
        high.stress_level = Some(9);
        let entries = vec![high, entry(0)];
        let stats = compute_stats(&entries, &GoalTargets::default());
        assert_eq!(stats.average_stress, 7.0);
    }

    #[test]
    fn goal_progress_eighty_percent() {
        let entries = vec![entry(8000), entry(8000)];
        let stats = compute_stats(&entries, &GoalTargets::default());
        assert_eq!(stats.goal_progress.steps, 80);
    }

    #[test]
    fn goal_progress_is_not_capped() {
        let entries = vec![entry(15000)];
        let stats = compute_stats(&entries, &GoalTargets::default());
        assert_eq!(stats.goal_progress.steps, 150);
    }

    #[test]
    fn mood_distribution_counts_each_value() {
        let mut good = entry(0);
        good.mood = Mood::Good;
        let entries = vec![good, entry(0), entry(0)];
        let stats = compute_stats(&entries, &GoalTargets::default());
        assert_eq!(stats.mood_distribution.get("good"), Some(&1));
        assert_eq!(stats.mood_distribution.get("okay"), Some(&2));
    }

    #[test]
    fn exercise_days_counts_flagged_entries() {
        let mut active = entry(0);
        active.activity = Json(Activity {
            exercise: true,
            ..Default::default()
        });
        let entries = vec![active, entry(0)];
        let stats = compute_stats(&entries, &GoalTargets::default());
        assert_eq!(stats.exercise_days, 1);
    }

    #[test]
    fn active_daily_goals_override_default_targets() {
        let goal = WellnessGoal {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            goal_type: GoalType::Steps,
            target: 12000.0,
            current: 0.0,
            period: GoalPeriod::Daily,
            start_date: Utc::now(),
            end_date: Utc::now(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let targets = GoalTargets::from_active_goals(&[goal]);
        assert_eq!(targets.daily_steps, 12000.0);
        assert_eq!(targets.sleep_hours, 8.0);
    }
}
