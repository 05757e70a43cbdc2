//! Threshold rules evaluated against a just-written entry. Each rule that
//! fires yields one independent draft; the store inserts them as a batch.
//! Re-submitting the same day re-evaluates and may emit duplicates — there is
//! no dedup against earlier alerts for the same date.

use serde_json::json;

use crate::models::alert::{AlertSeverity, AlertType};
use crate::models::entry::WellnessEntry;

#[derive(Debug, Clone)]
pub struct AlertDraft {
    pub alert_type: AlertType,
    pub message: String,
    pub severity: AlertSeverity,
    pub data: serde_json::Value,
}

/// Thresholds are strict (steps == 5000 does not fire) and optional fields
/// that were never logged do not fire at all.
pub fn evaluate_entry(entry: &WellnessEntry) -> Vec<AlertDraft> {
    let mut alerts = Vec::new();

    if entry.steps < 5000 {
        alerts.push(AlertDraft {
            alert_type: AlertType::LowSteps,
            message: format!(
                "You only took {} steps today. Try to reach at least 5,000 steps for better health!",
                entry.steps
            ),
            severity: if entry.steps < 2000 {
                AlertSeverity::High
            } else {
                AlertSeverity::Medium
            },
            data: json!({ "steps": entry.steps, "date": entry.entry_date }),
        });
    }

    if let Some(sleep_hours) = entry.sleep_hours {
        if sleep_hours < 6.0 {
            alerts.push(AlertDraft {
                alert_type: AlertType::PoorSleep,
                message: format!(
                    "You only slept {sleep_hours} hours last night. Aim for 7-9 hours for optimal rest!"
                ),
                severity: if sleep_hours < 4.0 {
                    AlertSeverity::High
                } else {
                    AlertSeverity::Medium
                },
                data: json!({ "sleepHours": sleep_hours, "date": entry.entry_date }),
            });
        }
    }

    if let Some(stress_level) = entry.stress_level {
        if stress_level > 7 {
            alerts.push(AlertDraft {
                alert_type: AlertType::HighStress,
                message: format!(
                    "Your stress level is {stress_level}/10. Consider taking a break or trying relaxation techniques."
                ),
                severity: if stress_level > 8 {
                    AlertSeverity::High
                } else {
                    AlertSeverity::Medium
                },
                data: json!({ "stressLevel": stress_level, "date": entry.entry_date }),
            });
        }
    }

    let water_intake = entry.diet.water_intake;
    if water_intake < 1.5 {
        alerts.push(AlertDraft {
            alert_type: AlertType::LowWater,
            message: format!(
                "You only drank {water_intake}L of water today. Stay hydrated with at least 2L daily!"
            ),
            severity: if water_intake < 1.0 {
                AlertSeverity::High
            } else {
                AlertSeverity::Medium
            },
            data: json!({ "waterIntake": water_intake, "date": entry.entry_date }),
        });
    }

    if let Some(study_hours) = entry.study_hours {
        if study_hours < 2.0 {
            alerts.push(AlertDraft {
                alert_type: AlertType::MissedStudy,
                message: format!(
                    "You studied for only {study_hours} hours today. Consider setting aside more time for your studies."
                ),
                severity: if study_hours < 1.0 {
                    AlertSeverity::High
                } else {
                    AlertSeverity::Low
                },
                data: json!({ "studyHours": study_hours, "date": entry.entry_date }),
            });
        }
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::{Activity, Diet, DietPatch, Mood, Source, WellnessEntry};
    use chrono::{NaiveDate, Utc};
    use sqlx::types::Json;
    use uuid::Uuid;

    fn base_entry() -> WellnessEntry {
        WellnessEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            steps: 10000,
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

    fn find(alerts: &[AlertDraft], kind: AlertType) -> Option<&AlertDraft> {
        alerts.iter().find(|a| a.alert_type == kind)
    }

    #[test]
    fn steps_threshold_is_strict() {
        let mut entry = base_entry();
        entry.steps = 5000;
        assert!(find(&evaluate_entry(&entry), AlertType::LowSteps).is_none());

        entry.steps = 4999;
        let alerts = evaluate_entry(&entry);
        let alert = find(&alerts, AlertType::LowSteps).unwrap();
        assert_eq!(alert.severity, AlertSeverity::Medium);

        entry.steps = 1999;
        let alerts = evaluate_entry(&entry);
        assert_eq!(
            find(&alerts, AlertType::LowSteps).unwrap().severity,
            AlertSeverity::High
        );
    }

    #[test]
    fn missing_optional_fields_never_trigger() {
        let entry = base_entry(); // no sleep, study, or stress logged
        let alerts = evaluate_entry(&entry);
        assert!(find(&alerts, AlertType::PoorSleep).is_none());
        assert!(find(&alerts, AlertType::MissedStudy).is_none());
        assert!(find(&alerts, AlertType::HighStress).is_none());
    }

    #[test]
    fn bad_day_emits_all_five_alerts_at_high_severity() {
        let mut entry = base_entry();
        entry.steps = 1500;
        entry.sleep_hours = Some(3.0);
        entry.stress_level = Some(9);
        entry.study_hours = Some(0.5);
        entry.diet = Json(
            DietPatch {
                water_intake: Some(0.8),
                ..Default::default()
            }
            .merged_into(Diet::default()),
        );

        let alerts = evaluate_entry(&entry);
        assert_eq!(alerts.len(), 5);
        for alert in &alerts {
            assert_eq!(alert.severity, AlertSeverity::High);
        }
    }

    #[test]
    fn light_study_day_is_low_severity() {
        let mut entry = base_entry();
        entry.study_hours = Some(1.5);
        let alerts = evaluate_entry(&entry);
        assert_eq!(
            find(&alerts, AlertType::MissedStudy).unwrap().severity,
            AlertSeverity::Low
        );
    }

    #[test]
    fn water_boundaries() {
        let mut entry = base_entry();
        entry.diet = Json(Diet {
            water_intake: 1.5,
            ..Default::default()
        });
        assert!(find(&evaluate_entry(&entry), AlertType::LowWater).is_none());

        entry.diet = Json(Diet {
            water_intake: 1.2,
            ..Default::default()
        });
        assert_eq!(
            find(&evaluate_entry(&entry), AlertType::LowWater)
                .unwrap()
                .severity,
            AlertSeverity::Medium
        );

        entry.diet = Json(Diet {
            water_intake: 0.9,
            ..Default::default()
        });
        assert_eq!(
            find(&evaluate_entry(&entry), AlertType::LowWater)
                .unwrap()
                .severity,
            AlertSeverity::High
        );
    }

    #[test]
    fn payload_captures_triggering_value_and_date() {
        let mut entry = base_entry();
        entry.steps = 100;
        let alerts = evaluate_entry(&entry);
        let alert = find(&alerts, AlertType::LowSteps).unwrap();
        assert_eq!(alert.data["steps"], 100);
        assert_eq!(alert.data["date"], "2024-01-01");
    }
}
