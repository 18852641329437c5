use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::db::JournalSource;
use crate::dto::{
    entry_date_or_today, journal_text, CreateJournalEntryRequest, FeedResponse,
    JournalPageResponse, UpdateJournalEntryRequest, MAX_JOURNAL_PAGE,
};
use crate::error::{AppError, AppResult};
use crate::models::journal::{JournalEntry, JournalPageQuery};
use crate::services::journal_feed::{collect_all, CursorSnapshot};
use crate::AppState;

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateJournalEntryRequest>,
) -> AppResult<Json<JournalEntry>> {
    body.validate()?;
    let text = journal_text(&body.journal_text)?;
    let entry_date = entry_date_or_today(body.entry_date, Utc::now().date_naive())?;

    let entry = sqlx::query_as::<_, JournalEntry>(
        r#"
        INSERT INTO journal_entries (user_id, entry_date, journal_text)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(auth_user.id)
    .bind(entry_date)
    .bind(text)
    .fetch_one(&state.db)
    .await?;

    state.feeds.invalidate(auth_user.id).await;
    Ok(Json(entry))
}

/// One page of entries with id greater than `after`, oldest first.
pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<JournalPageQuery>,
) -> AppResult<Json<JournalPageResponse>> {
    let limit = query
        .limit
        .unwrap_or(state.config.journal_page_size)
        .clamp(1, MAX_JOURNAL_PAGE);

    let entries = state.store.fetch_page(auth_user.id, query.after, limit).await?;

    Ok(Json(JournalPageResponse::new(entries, query.after, limit)))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<i64>,
) -> AppResult<Json<JournalEntry>> {
    let entry = sqlx::query_as::<_, JournalEntry>(
        "SELECT * FROM journal_entries WHERE id = $1 AND user_id = $2",
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Journal entry not found".into()))?;

    Ok(Json(entry))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<i64>,
    Json(body): Json<UpdateJournalEntryRequest>,
) -> AppResult<Json<JournalEntry>> {
    body.validate()?;
    let text = journal_text(&body.journal_text)?;

    let entry = sqlx::query_as::<_, JournalEntry>(
        r#"
        UPDATE journal_entries SET
            journal_text = $3,
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .bind(text)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Journal entry not found".into()))?;

    state.feeds.invalidate(auth_user.id).await;
    Ok(Json(entry))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM journal_entries WHERE id = $1 AND user_id = $2")
        .bind(entry_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Journal entry not found".into()));
    }

    state.feeds.invalidate(auth_user.id).await;
    Ok(Json(serde_json::json!({ "deleted": true, "id": entry_id })))
}

/// Advances the caller's swipe feed by one page.
pub async fn feed_next(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<FeedResponse>> {
    let cursor = state.feeds.cursor_for(auth_user.id).await;
    let outcome = cursor.fetch_more(&state.store).await?;
    let snapshot = cursor.snapshot().await;

    Ok(Json(FeedResponse::new(outcome, snapshot)))
}

pub async fn feed_reset(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<CursorSnapshot>> {
    state.feeds.reset(auth_user.id).await;
    let cursor = state.feeds.cursor_for(auth_user.id).await;
    Ok(Json(cursor.snapshot().await))
}

pub async fn export_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<JournalEntry>>> {
    let entries = collect_all(&state.store, auth_user.id, MAX_JOURNAL_PAGE).await?;
    tracing::info!(user_id = %auth_user.id, count = entries.len(), "Journal exported");
    Ok(Json(entries))
}
