use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// One wellness record per (user, calendar day). The `(user_id, entry_date)`
/// unique index is what every upsert leans on.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WellnessEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "date")]
    pub entry_date: NaiveDate,
    pub steps: i32,
    pub heart_rate: Option<i32>,
    pub sleep_hours: Option<f64>,
    pub study_hours: Option<f64>,
    pub stress_level: Option<i32>,
    pub mood: Mood,
    pub diet: Json<Diet>,
    pub activity: Json<Activity>,
    pub notes: Option<String>,
    pub source: Source,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, PartialOrd, Ord)]
#[sqlx(type_name = "mood", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Excellent,
    Good,
    Okay,
    Poor,
    Terrible,
}

impl Default for Mood {
    fn default() -> Self {
        Self::Okay
    }
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Excellent => "excellent",
            Mood::Good => "good",
            Mood::Okay => "okay",
            Mood::Poor => "poor",
            Mood::Terrible => "terrible",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "entry_source", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Manual,
    Smartwatch,
    #[sqlx(rename = "ai-suggested")]
    #[serde(rename = "ai-suggested")]
    AiSuggested,
}

impl Default for Source {
    fn default() -> Self {
        Self::Manual
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Diet {
    pub meals: i32,
    pub water_intake: f64,
    pub junk_food: bool,
}

impl Default for Diet {
    fn default() -> Self {
        Self {
            meals: 3,
            water_intake: 2.0,
            junk_food: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub exercise: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise_duration: Option<i32>,
}

impl Default for Activity {
    fn default() -> Self {
        Self {
            exercise: false,
            exercise_type: None,
            exercise_duration: None,
        }
    }
}

/// Maps an explicit JSON `null` to `Some(None)` so it stays distinguishable
/// from an absent key: absent keeps the stored value, `null` clears it.
fn clearable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Typed partial update. `None` means "leave the stored value alone"; `Some`
/// overwrites. The nullable scalar fields (`heart_rate`, `notes`) carry a
/// third state: an explicit `null` clears the stored value. Sub-objects
/// patch field-by-field, never wholesale.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    #[validate(range(min = 0, message = "steps must be >= 0"))]
    pub steps: Option<i32>,
    #[validate(range(min = 30, max = 220, message = "heartRate must be 30-220"))]
    #[serde(default, deserialize_with = "clearable")]
    pub heart_rate: Option<Option<i32>>,
    #[validate(range(min = 0.0, max = 24.0, message = "sleepHours must be 0-24"))]
    pub sleep_hours: Option<f64>,
    #[validate(range(min = 0.0, max = 24.0, message = "studyHours must be 0-24"))]
    pub study_hours: Option<f64>,
    #[validate(range(min = 1, max = 10, message = "stressLevel must be 1-10"))]
    pub stress_level: Option<i32>,
    pub mood: Option<Mood>,
    #[validate]
    pub diet: Option<DietPatch>,
    #[validate]
    pub activity: Option<ActivityPatch>,
    #[validate(length(max = 500, message = "notes must be under 500 characters"))]
    #[serde(default, deserialize_with = "clearable")]
    pub notes: Option<Option<String>>,
    pub source: Option<Source>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DietPatch {
    #[validate(range(min = 0, max = 10, message = "meals must be 0-10"))]
    pub meals: Option<i32>,
    #[validate(range(min = 0.0, max = 10.0, message = "waterIntake must be 0-10 liters"))]
    pub water_intake: Option<f64>,
    pub junk_food: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPatch {
    pub exercise: Option<bool>,
    pub exercise_type: Option<String>,
    #[validate(range(min = 0, message = "exerciseDuration must be >= 0"))]
    pub exercise_duration: Option<i32>,
}

impl DietPatch {
    /// Only the keys the caller actually sent, for a JSONB `||` merge.
    pub fn sparse(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        if let Some(meals) = self.meals {
            obj.insert("meals".into(), meals.into());
        }
        if let Some(water) = self.water_intake {
            obj.insert("waterIntake".into(), water.into());
        }
        if let Some(junk) = self.junk_food {
            obj.insert("junkFood".into(), junk.into());
        }
        serde_json::Value::Object(obj)
    }

    pub fn merged_into(&self, base: Diet) -> Diet {
        Diet {
            meals: self.meals.unwrap_or(base.meals),
            water_intake: self.water_intake.unwrap_or(base.water_intake),
            junk_food: self.junk_food.unwrap_or(base.junk_food),
        }
    }
}

impl ActivityPatch {
    pub fn sparse(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        if let Some(exercise) = self.exercise {
            obj.insert("exercise".into(), exercise.into());
        }
        if let Some(kind) = &self.exercise_type {
            obj.insert("exerciseType".into(), kind.clone().into());
        }
        if let Some(duration) = self.exercise_duration {
            obj.insert("exerciseDuration".into(), duration.into());
        }
        serde_json::Value::Object(obj)
    }

    pub fn merged_into(&self, base: Activity) -> Activity {
        Activity {
            exercise: self.exercise.unwrap_or(base.exercise),
            exercise_type: self.exercise_type.clone().or(base.exercise_type),
            exercise_duration: self.exercise_duration.or(base.exercise_duration),
        }
    }
}

impl EntryPatch {
    /// Full diet document for a fresh insert: schema defaults overlaid with
    /// whatever the patch provides.
    pub fn diet_for_insert(&self) -> Diet {
        self.diet
            .as_ref()
            .map(|p| p.merged_into(Diet::default()))
            .unwrap_or_default()
    }

    pub fn activity_for_insert(&self) -> Activity {
        self.activity
            .as_ref()
            .map(|p| p.merged_into(Activity::default()))
            .unwrap_or_default()
    }

    pub fn diet_sparse(&self) -> serde_json::Value {
        self.diet
            .as_ref()
            .map(|p| p.sparse())
            .unwrap_or_else(|| serde_json::json!({}))
    }

    pub fn activity_sparse(&self) -> serde_json::Value {
        self.activity
            .as_ref()
            .map(|p| p.sparse())
            .unwrap_or_else(|| serde_json::json!({}))
    }
}

/// POST /api/wellness/add body: an explicit date plus the partial fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEntryRequest {
    pub date: Option<NaiveDate>,
    #[serde(flatten)]
    pub patch: EntryPatch,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub period: Option<String>,
}

impl DashboardQuery {
    /// Window length in days; unknown values fall back to a week.
    pub fn period_days(&self) -> i64 {
        match self.period.as_deref() {
            Some("1d") => 1,
            Some("7d") | None => 7,
            Some("30d") => 30,
            Some("90d") => 90,
            _ => 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn out_of_range_stress_is_rejected() {
        let patch = EntryPatch {
            stress_level: Some(11),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn nested_diet_range_is_rejected() {
        let patch = EntryPatch {
            diet: Some(DietPatch {
                water_intake: Some(12.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn sparse_diet_only_carries_sent_fields() {
        let patch = DietPatch {
            water_intake: Some(1.2),
            ..Default::default()
        };
        let value = patch.sparse();
        assert_eq!(value, serde_json::json!({ "waterIntake": 1.2 }));
    }

    #[test]
    fn insert_diet_overlays_defaults() {
        let patch = EntryPatch {
            diet: Some(DietPatch {
                meals: Some(4),
                ..Default::default()
            }),
            ..Default::default()
        };
        let diet = patch.diet_for_insert();
        assert_eq!(diet.meals, 4);
        assert_eq!(diet.water_intake, 2.0);
        assert!(!diet.junk_food);
    }

    #[test]
    fn explicit_null_is_distinct_from_absent() {
        let cleared: EntryPatch = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        assert_eq!(cleared.notes, Some(None));
        assert!(cleared.heart_rate.is_none());

        let absent: EntryPatch = serde_json::from_str("{}").unwrap();
        assert!(absent.notes.is_none());

        let set: EntryPatch = serde_json::from_str(r#"{"heartRate": 62}"#).unwrap();
        assert_eq!(set.heart_rate, Some(Some(62)));
    }

    #[test]
    fn period_parsing_defaults_to_a_week() {
        assert_eq!(DashboardQuery { period: None }.period_days(), 7);
        assert_eq!(
            DashboardQuery {
                period: Some("90d".into())
            }
            .period_days(),
            90
        );
        assert_eq!(
            DashboardQuery {
                period: Some("bogus".into())
            }
            .period_days(),
            7
        );
    }
}
