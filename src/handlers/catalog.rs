use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::AppResult;
use crate::models::catalog::{group_by_category, Attribute, AttributeQuery, Category, CategoryGroup};
use crate::AppState;

async fn all_categories(db: &sqlx::PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name ASC")
        .fetch_all(db)
        .await
}

async fn all_attributes(db: &sqlx::PgPool) -> Result<Vec<Attribute>, sqlx::Error> {
    sqlx::query_as::<_, Attribute>(
        "SELECT id, category_id, name FROM attributes ORDER BY name ASC",
    )
    .fetch_all(db)
    .await
}

pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(all_categories(&state.db).await?))
}

pub async fn list_attributes(
    State(state): State<AppState>,
    Query(query): Query<AttributeQuery>,
) -> AppResult<Json<Vec<Attribute>>> {
    let attributes = match query.category_id {
        Some(category_id) => {
            sqlx::query_as::<_, Attribute>(
                "SELECT id, category_id, name FROM attributes WHERE category_id = $1 ORDER BY name ASC",
            )
            .bind(category_id)
            .fetch_all(&state.db)
            .await?
        }
        None => all_attributes(&state.db).await?,
    };

    Ok(Json(attributes))
}

/// Everything the intake form needs in one round trip.
pub async fn get_catalog(State(state): State<AppState>) -> AppResult<Json<Vec<CategoryGroup>>> {
    let (categories, attributes) =
        tokio::try_join!(all_categories(&state.db), all_attributes(&state.db))?;

    Ok(Json(group_by_category(categories, attributes)))
}
