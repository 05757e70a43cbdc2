//! Entry persistence. The one-entry-per-day invariant lives in the
//! `(user_id, entry_date)` unique index; writes go through a single
//! `INSERT .. ON CONFLICT DO UPDATE` so a manual submission racing a sync for
//! the same day can never produce two rows or a lost update.

use chrono::NaiveDate;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::entry::{EntryPatch, WellnessEntry};

#[derive(Debug)]
pub struct UpsertedEntry {
    pub entry: WellnessEntry,
    pub created: bool,
}

#[derive(FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    entry: WellnessEntry,
    inserted: bool,
}

/// Merge `patch` into the entry for (user, day), creating it with schema
/// defaults when absent. Present fields overwrite; an explicit null on
/// `heart_rate`/`notes` clears the stored value; `diet`/`activity` merge
/// key-by-key via JSONB `||` with only the keys the caller sent.
pub async fn upsert_entry(
    db: &PgPool,
    user_id: Uuid,
    date: NaiveDate,
    patch: &EntryPatch,
) -> AppResult<UpsertedEntry> {
    let row = sqlx::query_as::<_, UpsertRow>(
        r#"
        INSERT INTO wellness_entries
            (id, user_id, entry_date, steps, heart_rate, sleep_hours, study_hours,
             stress_level, mood, diet, activity, notes, source)
        VALUES ($1, $2, $3, COALESCE($4, 0), $5, $6, $7, $8,
                COALESCE($9, 'okay'), $10, $11, $12, COALESCE($13, 'manual'))
        ON CONFLICT (user_id, entry_date) DO UPDATE SET
            steps = COALESCE($4, wellness_entries.steps),
            heart_rate = CASE WHEN $16 THEN NULL
                         ELSE COALESCE($5, wellness_entries.heart_rate) END,
            sleep_hours = COALESCE($6, wellness_entries.sleep_hours),
            study_hours = COALESCE($7, wellness_entries.study_hours),
            stress_level = COALESCE($8, wellness_entries.stress_level),
            mood = COALESCE($9, wellness_entries.mood),
            diet = wellness_entries.diet || $14,
            activity = wellness_entries.activity || $15,
            notes = CASE WHEN $17 THEN NULL
                    ELSE COALESCE($12, wellness_entries.notes) END,
            source = COALESCE($13, wellness_entries.source),
            updated_at = NOW()
        RETURNING *, (xmax = 0) AS inserted
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(date)
    .bind(patch.steps)
    .bind(patch.heart_rate.flatten())
    .bind(patch.sleep_hours)
    .bind(patch.study_hours)
    .bind(patch.stress_level)
    .bind(patch.mood)
    .bind(Json(patch.diet_for_insert()))
    .bind(Json(patch.activity_for_insert()))
    .bind(patch.notes.clone().flatten())
    .bind(patch.source)
    .bind(patch.diet_sparse())
    .bind(patch.activity_sparse())
    .bind(matches!(patch.heart_rate, Some(None)))
    .bind(matches!(patch.notes, Some(None)))
    .fetch_one(db)
    .await?;

    Ok(UpsertedEntry {
        entry: row.entry,
        created: row.inserted,
    })
}

/// Entries with date in [start, end], newest first.
pub async fn query_range(
    db: &PgPool,
    user_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<Vec<WellnessEntry>> {
    let entries = sqlx::query_as::<_, WellnessEntry>(
        r#"
        SELECT * FROM wellness_entries
        WHERE user_id = $1 AND entry_date BETWEEN $2 AND $3
        ORDER BY entry_date DESC
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;

    Ok(entries)
}

/// Raw history with optional bounds and a row limit.
pub async fn history(
    db: &PgPool,
    user_id: Uuid,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    limit: i64,
) -> AppResult<Vec<WellnessEntry>> {
    let entries = sqlx::query_as::<_, WellnessEntry>(
        r#"
        SELECT * FROM wellness_entries
        WHERE user_id = $1
          AND ($2::date IS NULL OR entry_date >= $2)
          AND ($3::date IS NULL OR entry_date <= $3)
        ORDER BY entry_date DESC
        LIMIT $4
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .bind(limit)
    .fetch_all(db)
    .await?;

    Ok(entries)
}

/// Distinct entry dates going back from `since`, for streak computation.
pub async fn entry_dates_since(
    db: &PgPool,
    user_id: Uuid,
    since: NaiveDate,
) -> AppResult<Vec<NaiveDate>> {
    let dates = sqlx::query_scalar::<_, NaiveDate>(
        r#"
        SELECT entry_date FROM wellness_entries
        WHERE user_id = $1 AND entry_date >= $2
        ORDER BY entry_date DESC
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(db)
    .await?;

    Ok(dates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::{DietPatch, Source};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn repeated_upserts_keep_one_row_and_merge_fields(db: PgPool) {
        let user = Uuid::new_v4();

        let first = EntryPatch {
            steps: Some(3000),
            sleep_hours: Some(7.0),
            notes: Some(Some("gym day".into())),
            ..Default::default()
        };
        let created = upsert_entry(&db, user, day(), &first).await.unwrap();
        assert!(created.created);
        assert_eq!(created.entry.steps, 3000);
        assert_eq!(created.entry.diet.meals, 3);

        let second = EntryPatch {
            stress_level: Some(8),
            diet: Some(DietPatch {
                water_intake: Some(1.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let updated = upsert_entry(&db, user, day(), &second).await.unwrap();
        assert!(!updated.created);
        assert_eq!(updated.entry.steps, 3000);
        assert_eq!(updated.entry.sleep_hours, Some(7.0));
        assert_eq!(updated.entry.stress_level, Some(8));
        assert_eq!(updated.entry.diet.water_intake, 1.0);
        assert_eq!(updated.entry.diet.meals, 3);
        assert_eq!(updated.entry.notes.as_deref(), Some("gym day"));

        let rows = query_range(&db, user, day(), day()).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn second_sync_overwrites_instead_of_accumulating(db: PgPool) {
        let user = Uuid::new_v4();
        let fetch = |steps: i32, sleep: f64| EntryPatch {
            steps: Some(steps),
            sleep_hours: Some(sleep),
            source: Some(Source::Smartwatch),
            ..Default::default()
        };

        upsert_entry(&db, user, day(), &fetch(6000, 6.5)).await.unwrap();
        let second = upsert_entry(&db, user, day(), &fetch(6200, 7.0)).await.unwrap();

        assert!(!second.created);
        assert_eq!(second.entry.steps, 6200);
        assert_eq!(second.entry.sleep_hours, Some(7.0));

        let rows = query_range(&db, user, day(), day()).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn explicit_null_clears_while_absent_preserves(db: PgPool) {
        let user = Uuid::new_v4();

        let with_values = EntryPatch {
            notes: Some(Some("rough week".into())),
            heart_rate: Some(Some(64)),
            ..Default::default()
        };
        upsert_entry(&db, user, day(), &with_values).await.unwrap();

        let untouched = upsert_entry(&db, user, day(), &EntryPatch::default())
            .await
            .unwrap();
        assert_eq!(untouched.entry.notes.as_deref(), Some("rough week"));
        assert_eq!(untouched.entry.heart_rate, Some(64));

        let cleared = upsert_entry(
            &db,
            user,
            day(),
            &EntryPatch {
                notes: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(cleared.entry.notes, None);
        assert_eq!(cleared.entry.heart_rate, Some(64));
    }
}
