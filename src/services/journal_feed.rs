//! Journal swipe feed: pages through a user's entries by ascending id.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::JournalSource;
use crate::error::AppResult;
use crate::models::journal::JournalEntry;

pub const DEFAULT_PAGE_SIZE: i64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Entries that were not held before this fetch.
    Fetched(Vec<JournalEntry>),
    /// Another fetch is already running; nothing was requested.
    Busy,
    /// The previous page was short, there is nothing left to request.
    Exhausted,
    /// The cursor was reset while the page was loading; the page was dropped.
    Discarded,
}

impl FetchOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            FetchOutcome::Fetched(_) => "fetched",
            FetchOutcome::Busy => "busy",
            FetchOutcome::Exhausted => "exhausted",
            FetchOutcome::Discarded => "discarded",
        }
    }

    pub fn into_entries(self) -> Vec<JournalEntry> {
        match self {
            FetchOutcome::Fetched(entries) => entries,
            _ => Vec::new(),
        }
    }
}

/// Everything the cursor has loaded so far.
#[derive(Debug, Clone, Serialize)]
pub struct CursorSnapshot {
    pub owner: Uuid,
    pub cursor: Option<i64>,
    pub has_more: bool,
    pub loaded: usize,
    pub loading: bool,
}

#[derive(Debug)]
struct CursorState {
    owner: Uuid,
    generation: u64,
    entries: Vec<JournalEntry>,
    held: HashSet<i64>,
    last_id: Option<i64>,
    has_more: bool,
}

impl CursorState {
    fn fresh(owner: Uuid, generation: u64) -> Self {
        Self {
            owner,
            generation,
            entries: Vec::new(),
            held: HashSet::new(),
            last_id: None,
            has_more: true,
        }
    }
}

/// Clears the in-flight flag when the fetch finishes, errors included.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct JournalCursor {
    state: Mutex<CursorState>,
    in_flight: AtomicBool,
    page_size: i64,
}

impl JournalCursor {
    pub fn new(owner: Uuid, page_size: i64) -> Self {
        Self {
            state: Mutex::new(CursorState::fresh(owner, 0)),
            in_flight: AtomicBool::new(false),
            page_size: page_size.max(1),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Requests the next page after the cursor and appends the entries not
    /// already held.
    ///
    /// On a storage error the held entries and the cursor are unchanged.
    pub async fn fetch_more<S>(&self, source: &S) -> AppResult<FetchOutcome>
    where
        S: JournalSource + ?Sized,
    {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return Ok(FetchOutcome::Busy);
        }
        let _in_flight = InFlight(&self.in_flight);

        let (owner, after, generation) = {
            let state = self.state.lock().await;
            if !state.has_more {
                return Ok(FetchOutcome::Exhausted);
            }
            (state.owner, state.last_id, state.generation)
        };

        let page = source.fetch_page(owner, after, self.page_size).await?;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            tracing::debug!(user_id = %owner, "Journal page dropped after cursor reset");
            return Ok(FetchOutcome::Discarded);
        }

        if let Some(last) = page.last() {
            state.last_id = Some(last.id);
        }
        state.has_more = page.len() as i64 >= self.page_size;

        let mut fresh = Vec::with_capacity(page.len());
        for entry in page {
            if state.held.insert(entry.id) {
                fresh.push(entry);
            }
        }
        state.entries.extend(fresh.iter().cloned());

        tracing::debug!(
            user_id = %owner,
            fetched = fresh.len(),
            cursor = ?state.last_id,
            has_more = state.has_more,
            "Journal page loaded"
        );

        Ok(FetchOutcome::Fetched(fresh))
    }

    /// Drops everything loaded so far and starts over for `owner`.
    pub async fn reset_for(&self, owner: Uuid) {
        let mut state = self.state.lock().await;
        let generation = state.generation + 1;
        *state = CursorState::fresh(owner, generation);
    }

    pub async fn entries(&self) -> Vec<JournalEntry> {
        self.state.lock().await.entries.clone()
    }

    pub async fn snapshot(&self) -> CursorSnapshot {
        let state = self.state.lock().await;
        CursorSnapshot {
            owner: state.owner,
            cursor: state.last_id,
            has_more: state.has_more,
            loaded: state.entries.len(),
            loading: self.is_loading(),
        }
    }
}

/// Loads every entry of a user by walking the cursor to the end.
pub async fn collect_all<S>(source: &S, owner: Uuid, page_size: i64) -> AppResult<Vec<JournalEntry>>
where
    S: JournalSource + ?Sized,
{
    let cursor = JournalCursor::new(owner, page_size);
    while let FetchOutcome::Fetched(_) = cursor.fetch_more(source).await? {}
    Ok(cursor.entries().await)
}

struct FeedSlot {
    cursor: Arc<JournalCursor>,
    last_used: Instant,
}

/// One server-held cursor per user, created on first use.
#[derive(Clone)]
pub struct JournalFeeds {
    slots: Arc<Mutex<HashMap<Uuid, FeedSlot>>>,
    page_size: i64,
}

impl JournalFeeds {
    pub fn new(page_size: i64) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            page_size,
        }
    }

    pub async fn cursor_for(&self, user_id: Uuid) -> Arc<JournalCursor> {
        let mut slots = self.slots.lock().await;
        let slot = slots.entry(user_id).or_insert_with(|| FeedSlot {
            cursor: Arc::new(JournalCursor::new(user_id, self.page_size)),
            last_used: Instant::now(),
        });
        slot.last_used = Instant::now();
        slot.cursor.clone()
    }

    pub async fn reset(&self, user_id: Uuid) {
        let cursor = self.cursor_for(user_id).await;
        cursor.reset_for(user_id).await;
    }

    /// Starts an existing feed over after the user's journal changed.
    /// Users without a feed are left alone.
    pub async fn invalidate(&self, user_id: Uuid) {
        let cursor = self
            .slots
            .lock()
            .await
            .get(&user_id)
            .map(|slot| slot.cursor.clone());
        if let Some(cursor) = cursor {
            cursor.reset_for(user_id).await;
        }
    }

    pub async fn remove(&self, user_id: Uuid) {
        self.slots.lock().await.remove(&user_id);
    }

    /// Drops feeds that have not been touched for `idle`. Returns how many went.
    pub async fn purge_idle(&self, idle: Duration) -> usize {
        let mut slots = self.slots.lock().await;
        let before = slots.len();
        let now = Instant::now();
        slots.retain(|_, slot| now.duration_since(slot.last_used) < idle);
        before - slots.len()
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }
}

pub fn spawn_feed_sweeper(feeds: JournalFeeds, idle: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            let purged = feeds.purge_idle(idle).await;
            if purged > 0 {
                let remaining = feeds.len().await;
                tracing::info!(purged = purged, remaining = remaining, "Journal feed sweep: dropped idle cursors");
            }
        }
    });
}
