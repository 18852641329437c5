use std::collections::HashSet;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{entry_date_or_today, RatingRequest, SelectionRequest, SelectionResponse};
use crate::error::{AppError, AppResult};
use crate::models::response::{Response, ResponseHistoryQuery, ResponseQuery};
use crate::services::intake::DailySelection;
use crate::AppState;

pub async fn get_response(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ResponseQuery>,
) -> AppResult<Json<Option<Response>>> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let response = sqlx::query_as::<_, Response>(
        "SELECT * FROM responses WHERE user_id = $1 AND entry_date = $2",
    )
    .bind(auth_user.id)
    .bind(date)
    .fetch_optional(&state.db)
    .await?;

    Ok(Json(response))
}

pub async fn list_responses(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ResponseHistoryQuery>,
) -> AppResult<Json<Vec<Response>>> {
    let end = query.end_date.unwrap_or_else(|| Utc::now().date_naive());
    let start = query
        .start_date
        .unwrap_or_else(|| end - chrono::Duration::days(30));

    let responses = sqlx::query_as::<_, Response>(
        r#"
        SELECT * FROM responses
        WHERE user_id = $1 AND entry_date BETWEEN $2 AND $3
        ORDER BY entry_date DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(responses))
}

pub async fn put_rating(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<RatingRequest>,
) -> AppResult<Json<Response>> {
    body.validate()?;
    let entry_date = entry_date_or_today(body.entry_date, Utc::now().date_naive())?;

    let response = sqlx::query_as::<_, Response>(
        r#"
        INSERT INTO responses (id, user_id, entry_date, scale_rating)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, entry_date) DO UPDATE SET
            scale_rating = EXCLUDED.scale_rating,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(entry_date)
    .bind(body.scale_rating)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(response))
}

/// Replaces the day's attribute selection with the set sent by the client,
/// writing only what changed.
pub async fn put_attributes(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<SelectionRequest>,
) -> AppResult<Json<SelectionResponse>> {
    body.validate()?;
    let entry_date = entry_date_or_today(body.entry_date, Utc::now().date_naive())?;
    let current: HashSet<Uuid> = body.attribute_ids.into_iter().collect();

    if !current.is_empty() {
        let ids: Vec<Uuid> = current.iter().copied().collect();
        let known = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM attributes WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_one(&state.db)
            .await?;
        if known != ids.len() as i64 {
            return Err(AppError::Validation("Unknown attribute id".into()));
        }
    }

    let persisted = state.store.load_selection(auth_user.id, entry_date).await?;
    let mut selection = DailySelection::new(auth_user.id, entry_date, persisted);
    let diff = selection.sync(current, &state.store).await?;

    Ok(Json(SelectionResponse::new(
        selection.entry_date(),
        diff,
        selection.persisted(),
    )))
}
