//! # MindGarden — Request/Response DTOs
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON body
//! - `*Response` → serialized to client JSON
//! - Field validation is expressed via `validator` derive macros; cross-field
//!   rules live in methods on the request type

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::journal::JournalEntry;
use crate::models::user::UserProfile;
use crate::services::intake::SelectionDiff;
use crate::services::journal_feed::{CursorSnapshot, FetchOutcome};

pub const MAX_JOURNAL_PAGE: i64 = 50;

/// Resolves an optional client date to the day a write applies to.
///
/// Clients may be up to one day ahead of server UTC; anything later is
/// rejected.
pub fn entry_date_or_today(requested: Option<NaiveDate>, today: NaiveDate) -> AppResult<NaiveDate> {
    let date = requested.unwrap_or(today);
    if date > today + Duration::days(1) {
        return Err(AppError::Validation("entry_date cannot be in the future".into()));
    }
    Ok(date)
}

// ============================================================================
// Common
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Auth & profile
// ============================================================================

/// POST /api/auth/register
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 254, message = "Email too long"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,

    #[validate(length(max = 100, message = "Last name must be under 100 characters"))]
    #[serde(default)]
    pub last_name: String,
}

/// POST /api/auth/login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// POST /api/auth/refresh
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response for register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: UserProfile,
}

/// PUT /api/me — partial update
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(max = 100, message = "Last name must be under 100 characters"))]
    pub last_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// PUT /api/me/password
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub new_password: String,
    pub confirm_password: String,
}

impl ChangePasswordRequest {
    pub fn check(&self) -> AppResult<()> {
        self.validate()?;
        if self.new_password != self.confirm_password {
            return Err(AppError::Validation("Passwords do not match".into()));
        }
        Ok(())
    }
}

// ============================================================================
// Daily responses
// ============================================================================

/// PUT /api/responses/rating
#[derive(Debug, Deserialize, Validate)]
pub struct RatingRequest {
    pub entry_date: Option<NaiveDate>,

    #[validate(range(min = 1, max = 5, message = "Scale rating must be 1-5"))]
    pub scale_rating: i16,
}

/// PUT /api/responses/attributes — the full set currently toggled on
#[derive(Debug, Deserialize, Validate)]
pub struct SelectionRequest {
    pub entry_date: Option<NaiveDate>,

    #[validate(length(max = 200, message = "Too many attributes selected"))]
    pub attribute_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub entry_date: NaiveDate,
    pub added: Vec<Uuid>,
    pub removed: Vec<Uuid>,
    pub attribute_ids: Vec<Uuid>,
}

impl SelectionResponse {
    pub fn new<'a>(entry_date: NaiveDate, diff: SelectionDiff, selected: impl IntoIterator<Item = &'a Uuid>) -> Self {
        Self {
            entry_date,
            added: sorted(diff.added),
            removed: sorted(diff.removed),
            attribute_ids: sorted(selected.into_iter().copied()),
        }
    }
}

fn sorted(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort();
    ids
}

// ============================================================================
// Journal
// ============================================================================

/// POST /api/journal
#[derive(Debug, Deserialize, Validate)]
pub struct CreateJournalEntryRequest {
    #[validate(length(max = 10000, message = "Journal entry must be under 10000 characters"))]
    pub journal_text: String,
    pub entry_date: Option<NaiveDate>,
}

/// PUT /api/journal/{id}
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateJournalEntryRequest {
    #[validate(length(max = 10000, message = "Journal entry must be under 10000 characters"))]
    pub journal_text: String,
}

/// Rejects entries that are only whitespace.
pub fn journal_text(raw: &str) -> AppResult<&str> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(AppError::Validation("Journal entry cannot be empty".into()));
    }
    Ok(text)
}

/// GET /api/journal
#[derive(Debug, Serialize)]
pub struct JournalPageResponse {
    pub entries: Vec<JournalEntry>,
    pub next_cursor: Option<i64>,
    pub has_more: bool,
}

impl JournalPageResponse {
    pub fn new(entries: Vec<JournalEntry>, after: Option<i64>, limit: i64) -> Self {
        let has_more = entries.len() as i64 >= limit;
        let next_cursor = entries.last().map(|e| e.id).or(after);
        Self {
            entries,
            next_cursor,
            has_more,
        }
    }
}

/// POST /api/journal/feed/next
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub status: &'static str,
    pub entries: Vec<JournalEntry>,
    pub cursor: Option<i64>,
    pub has_more: bool,
    pub loaded: usize,
}

impl FeedResponse {
    pub fn new(outcome: FetchOutcome, snapshot: CursorSnapshot) -> Self {
        let status = outcome.status();
        Self {
            status,
            entries: outcome.into_entries(),
            cursor: snapshot.cursor,
            has_more: snapshot.has_more,
            loaded: snapshot.loaded,
        }
    }
}

// ============================================================================
// Sleep
// ============================================================================

/// POST /api/sleep
#[derive(Debug, Deserialize)]
pub struct CreateSleepEntryRequest {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub entry_date: Option<NaiveDate>,
}

impl CreateSleepEntryRequest {
    /// Both ends present and in order.
    pub fn interval(&self) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return Err(AppError::Validation(
                "Both start and end times are required".into(),
            ));
        };
        if start >= end {
            return Err(AppError::Validation(
                "Start time must be before end time".into(),
            ));
        }
        Ok((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── Dates ────────────────────────────────────────────────────────────

    #[test]
    fn test_entry_date_defaults_to_today() {
        let today = day(2026, 4, 2);
        assert_eq!(entry_date_or_today(None, today).unwrap(), today);
    }

    #[test]
    fn test_entry_date_allows_past_and_tomorrow() {
        let today = day(2026, 4, 2);
        assert!(entry_date_or_today(Some(day(2025, 12, 31)), today).is_ok());
        assert!(entry_date_or_today(Some(day(2026, 4, 3)), today).is_ok());
        assert!(entry_date_or_today(Some(day(2026, 4, 4)), today).is_err());
    }

    // ── Auth ─────────────────────────────────────────────────────────────

    #[test]
    fn test_register_request_validation() {
        let json = r#"{"email":"sprout@example.com","password":"longenough","first_name":"Sam"}"#;
        let req: RegisterRequest = serde_json::from_str(json).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.last_name, "");

        let json = r#"{"email":"not-an-email","password":"short","first_name":""}"#;
        let req: RegisterRequest = serde_json::from_str(json).unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("first_name"));
    }

    #[test]
    fn test_change_password_mismatch() {
        let req = ChangePasswordRequest {
            new_password: "newpassword1".into(),
            confirm_password: "newpassword2".into(),
        };
        match req.check() {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "Passwords do not match"),
            other => panic!("unexpected: {:?}", other),
        }

        let req = ChangePasswordRequest {
            new_password: "newpassword1".into(),
            confirm_password: "newpassword1".into(),
        };
        assert!(req.check().is_ok());
    }

    // ── Responses ────────────────────────────────────────────────────────

    #[test]
    fn test_rating_out_of_range() {
        let req: RatingRequest = serde_json::from_str(r#"{"scale_rating":6}"#).unwrap();
        assert!(req.validate().is_err());
        let req: RatingRequest = serde_json::from_str(r#"{"scale_rating":0}"#).unwrap();
        assert!(req.validate().is_err());
        let req: RatingRequest =
            serde_json::from_str(r#"{"scale_rating":3,"entry_date":"2026-04-02"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.entry_date, Some(day(2026, 4, 2)));
    }

    #[test]
    fn test_selection_response_is_sorted() {
        let mut ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let diff = SelectionDiff {
            added: ids[..2].iter().copied().collect(),
            removed: ids[2..3].iter().copied().collect(),
        };

        let resp = SelectionResponse::new(day(2026, 4, 2), diff, ids.iter());

        ids.sort();
        assert_eq!(resp.attribute_ids, ids);
        assert!(resp.added.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(resp.removed.len(), 1);
    }

    // ── Journal ──────────────────────────────────────────────────────────

    #[test]
    fn test_journal_text_rejects_blank() {
        assert!(journal_text("   \n\t").is_err());
        assert_eq!(journal_text("  slept well \n").unwrap(), "slept well");
    }

    fn entry(id: i64) -> JournalEntry {
        let now = Utc::now();
        JournalEntry {
            id,
            user_id: Uuid::nil(),
            entry_date: day(2026, 4, 2),
            journal_text: "text".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_journal_page_full_page_has_more() {
        let page = JournalPageResponse::new((38..=42).map(entry).collect(), Some(37), 5);
        assert!(page.has_more);
        assert_eq!(page.next_cursor, Some(42));
    }

    #[test]
    fn test_journal_page_short_page_keeps_cursor() {
        let page = JournalPageResponse::new(Vec::new(), Some(42), 5);
        assert!(!page.has_more);
        assert_eq!(page.next_cursor, Some(42));
    }

    #[test]
    fn test_feed_response_busy_has_no_entries() {
        let snapshot = CursorSnapshot {
            owner: Uuid::nil(),
            cursor: Some(10),
            has_more: true,
            loaded: 10,
            loading: true,
        };
        let json = serde_json::to_value(FeedResponse::new(FetchOutcome::Busy, snapshot)).unwrap();
        assert_eq!(json["status"], "busy");
        assert_eq!(json["entries"], serde_json::json!([]));
        assert_eq!(json["cursor"], 10);
    }

    // ── Sleep ────────────────────────────────────────────────────────────

    #[test]
    fn test_sleep_interval_requires_both_ends() {
        let req: CreateSleepEntryRequest =
            serde_json::from_str(r#"{"start":"2026-04-01T23:00:00Z"}"#).unwrap();
        match req.interval() {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "Both start and end times are required"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_sleep_interval_must_be_ordered() {
        let req: CreateSleepEntryRequest = serde_json::from_str(
            r#"{"start":"2026-04-02T07:00:00Z","end":"2026-04-02T07:00:00Z"}"#,
        )
        .unwrap();
        assert!(req.interval().is_err());

        let req: CreateSleepEntryRequest = serde_json::from_str(
            r#"{"start":"2026-04-01T23:00:00Z","end":"2026-04-02T07:00:00Z"}"#,
        )
        .unwrap();
        let (start, end) = req.interval().unwrap();
        assert_eq!((end - start).num_hours(), 8);
    }
}
