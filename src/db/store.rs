//! Storage seams used by the intake form and the journal feed.
//!
//! Handlers talk to Postgres directly for plain CRUD. The two flows that keep
//! state between calls (selection diffing and journal paging) go through the
//! traits below so the state machines can be driven by an in-memory store in
//! tests.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::journal::JournalEntry;

/// Persists the attribute selection of a user's daily response.
#[async_trait]
pub trait SelectionStore: Send + Sync {
    /// Adds ids to the day's selection, creating the response row if needed.
    async fn add_attributes(&self, user_id: Uuid, entry_date: NaiveDate, ids: &[Uuid]) -> AppResult<()>;

    /// Removes ids from the day's selection. Missing rows are not an error.
    async fn remove_attributes(&self, user_id: Uuid, entry_date: NaiveDate, ids: &[Uuid]) -> AppResult<()>;
}

/// Source of journal entries ordered by ascending id.
#[async_trait]
pub trait JournalSource: Send + Sync {
    async fn fetch_page(&self, user_id: Uuid, after: Option<i64>, limit: i64) -> AppResult<Vec<JournalEntry>>;
}

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Attribute ids currently saved for the given day.
    pub async fn load_selection(&self, user_id: Uuid, entry_date: NaiveDate) -> AppResult<HashSet<Uuid>> {
        let ids = sqlx::query_scalar::<_, Vec<Uuid>>(
            "SELECT attribute_ids FROM responses WHERE user_id = $1 AND entry_date = $2",
        )
        .bind(user_id)
        .bind(entry_date)
        .fetch_optional(&self.db)
        .await?
        .unwrap_or_default();

        Ok(ids.into_iter().collect())
    }
}

#[async_trait]
impl SelectionStore for PgStore {
    async fn add_attributes(&self, user_id: Uuid, entry_date: NaiveDate, ids: &[Uuid]) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO responses (id, user_id, entry_date, attribute_ids)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, entry_date) DO UPDATE SET
                attribute_ids = ARRAY(
                    SELECT DISTINCT unnest(responses.attribute_ids || EXCLUDED.attribute_ids)
                ),
                updated_at = NOW()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(entry_date)
        .bind(ids)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn remove_attributes(&self, user_id: Uuid, entry_date: NaiveDate, ids: &[Uuid]) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE responses SET
                attribute_ids = ARRAY(
                    SELECT a FROM unnest(attribute_ids) AS a WHERE a <> ALL($3)
                ),
                updated_at = NOW()
            WHERE user_id = $1 AND entry_date = $2
            "#,
        )
        .bind(user_id)
        .bind(entry_date)
        .bind(ids)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl JournalSource for PgStore {
    async fn fetch_page(&self, user_id: Uuid, after: Option<i64>, limit: i64) -> AppResult<Vec<JournalEntry>> {
        let entries = sqlx::query_as::<_, JournalEntry>(
            r#"
            SELECT * FROM journal_entries
            WHERE user_id = $1 AND ($2::BIGINT IS NULL OR id > $2)
            ORDER BY id ASC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(after)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 9).unwrap()
    }

    async fn insert_user(db: &PgPool) -> Uuid {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO users (id, email, password_hash) VALUES ($1, $2, 'unused') RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(format!("{}@example.com", Uuid::new_v4()))
        .fetch_one(db)
        .await
        .unwrap()
    }

    async fn stored_ids(db: &PgPool, user_id: Uuid) -> Vec<Uuid> {
        sqlx::query_scalar::<_, Vec<Uuid>>(
            "SELECT attribute_ids FROM responses WHERE user_id = $1 AND entry_date = $2",
        )
        .bind(user_id)
        .bind(day())
        .fetch_one(db)
        .await
        .unwrap()
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_add_unions_without_duplicates(pool: PgPool) {
        let store = PgStore::new(pool.clone());
        let user_id = insert_user(&pool).await;
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        store.add_attributes(user_id, day(), &[a, b]).await.unwrap();
        store.add_attributes(user_id, day(), &[b, c]).await.unwrap();

        let mut raw = stored_ids(&pool, user_id).await;
        raw.sort();
        let mut expected = vec![a, b, c];
        expected.sort();
        assert_eq!(raw, expected);
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_remove_filters_only_listed_ids(pool: PgPool) {
        let store = PgStore::new(pool.clone());
        let user_id = insert_user(&pool).await;
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        store.add_attributes(user_id, day(), &[a, b, c]).await.unwrap();
        store.remove_attributes(user_id, day(), &[a, c]).await.unwrap();

        assert_eq!(
            store.load_selection(user_id, day()).await.unwrap(),
            HashSet::from([b])
        );
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_remove_without_response_row_is_ok(pool: PgPool) {
        let store = PgStore::new(pool.clone());
        let user_id = insert_user(&pool).await;

        store.remove_attributes(user_id, day(), &[Uuid::new_v4()]).await.unwrap();
        assert!(store.load_selection(user_id, day()).await.unwrap().is_empty());
    }
}
