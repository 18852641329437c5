use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::dto::{entry_date_or_today, CreateSleepEntryRequest};
use crate::error::{AppError, AppResult};
use crate::models::sleep::{SleepEntry, SleepQuery};
use crate::AppState;

pub async fn create_sleep_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateSleepEntryRequest>,
) -> AppResult<Json<SleepEntry>> {
    let (start, end) = body.interval()?;
    // A night is filed under the day it ended on
    let entry_date = entry_date_or_today(
        Some(body.entry_date.unwrap_or_else(|| end.date_naive())),
        Utc::now().date_naive(),
    )?;

    let entry = sqlx::query_as::<_, SleepEntry>(
        r#"
        INSERT INTO sleep_entries (id, user_id, start_at, end_at, entry_date)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(start)
    .bind(end)
    .bind(entry_date)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(entry))
}

pub async fn list_sleep_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<SleepQuery>,
) -> AppResult<Json<Vec<SleepEntry>>> {
    let end = query.end_date.unwrap_or_else(|| Utc::now().date_naive());
    let start = query
        .start_date
        .unwrap_or_else(|| end - chrono::Duration::days(30));

    let entries = sqlx::query_as::<_, SleepEntry>(
        r#"
        SELECT * FROM sleep_entries
        WHERE user_id = $1 AND entry_date BETWEEN $2 AND $3
        ORDER BY start_at DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(entries))
}

pub async fn delete_sleep_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM sleep_entries WHERE id = $1 AND user_id = $2")
        .bind(entry_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Sleep entry not found".into()));
    }

    Ok(Json(serde_json::json!({ "deleted": true, "id": entry_id })))
}
