use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct JournalEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub entry_date: NaiveDate,
    pub journal_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct JournalPageQuery {
    /// Only entries with an id strictly greater than this are returned.
    pub after: Option<i64>,
    pub limit: Option<i64>,
}
