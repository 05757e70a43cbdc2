use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::connection::{Provider, SmartwatchConnection};

pub struct NewConnection {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Connect = replace: any prior connection for this provider is deleted and a
/// fresh active one inserted, in one transaction. A user therefore has at
/// most one connection per provider.
pub async fn replace_connection(
    db: &PgPool,
    user_id: Uuid,
    provider: Provider,
    new: NewConnection,
    now: DateTime<Utc>,
) -> AppResult<SmartwatchConnection> {
    let mut tx = db.begin().await?;

    sqlx::query("DELETE FROM smartwatch_connections WHERE user_id = $1 AND provider = $2")
        .bind(user_id)
        .bind(provider)
        .execute(&mut *tx)
        .await?;

    let conn = sqlx::query_as::<_, SmartwatchConnection>(
        r#"
        INSERT INTO smartwatch_connections
            (id, user_id, provider, access_token, refresh_token, expires_at, last_sync, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(provider)
    .bind(&new.access_token)
    .bind(&new.refresh_token)
    .bind(new.expires_at)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(conn)
}

pub async fn active_connection(
    db: &PgPool,
    user_id: Uuid,
    provider: Provider,
) -> AppResult<Option<SmartwatchConnection>> {
    let conn = sqlx::query_as::<_, SmartwatchConnection>(
        r#"
        SELECT * FROM smartwatch_connections
        WHERE user_id = $1 AND provider = $2 AND is_active = TRUE
        "#,
    )
    .bind(user_id)
    .bind(provider)
    .fetch_optional(db)
    .await?;

    Ok(conn)
}

pub async fn list_connections(
    db: &PgPool,
    user_id: Uuid,
) -> AppResult<Vec<SmartwatchConnection>> {
    let conns = sqlx::query_as::<_, SmartwatchConnection>(
        "SELECT * FROM smartwatch_connections WHERE user_id = $1 ORDER BY created_at ASC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    Ok(conns)
}

/// Remove the provider's connection entirely. Returns whether anything was
/// actually removed.
pub async fn remove_connection(db: &PgPool, user_id: Uuid, provider: Provider) -> AppResult<bool> {
    let result =
        sqlx::query("DELETE FROM smartwatch_connections WHERE user_id = $1 AND provider = $2")
            .bind(user_id)
            .bind(provider)
            .execute(db)
            .await?;

    Ok(result.rows_affected() > 0)
}

/// Stamp a successful sync. Only called after the entry upsert has landed.
pub async fn touch_last_sync(
    db: &PgPool,
    connection_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<()> {
    sqlx::query("UPDATE smartwatch_connections SET last_sync = $2 WHERE id = $1")
        .bind(connection_id)
        .bind(now)
        .execute(db)
        .await?;

    Ok(())
}
