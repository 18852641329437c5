//! Daily intake form: turns the currently toggled attribute set into the
//! minimal insert/delete against what is already stored for the day.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::db::SelectionStore;
use crate::error::AppResult;

/// Difference between two selections. `added` and `removed` never overlap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionDiff {
    pub added: HashSet<Uuid>,
    pub removed: HashSet<Uuid>,
}

impl SelectionDiff {
    pub fn between(previous: &HashSet<Uuid>, current: &HashSet<Uuid>) -> Self {
        Self {
            added: current.difference(previous).copied().collect(),
            removed: previous.difference(current).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// The persisted selection for one user and day.
#[derive(Debug, Clone)]
pub struct DailySelection {
    user_id: Uuid,
    entry_date: NaiveDate,
    persisted: HashSet<Uuid>,
}

impl DailySelection {
    pub fn new(user_id: Uuid, entry_date: NaiveDate, persisted: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            user_id,
            entry_date,
            persisted: persisted.into_iter().collect(),
        }
    }

    pub fn persisted(&self) -> &HashSet<Uuid> {
        &self.persisted
    }

    pub fn entry_date(&self) -> NaiveDate {
        self.entry_date
    }

    /// Stores `current` as the day's selection.
    ///
    /// Additions and removals are written concurrently. Nothing is sent when
    /// the selection did not change. If either write fails the persisted set
    /// is left as it was and the error is returned.
    pub async fn sync<S>(&mut self, current: HashSet<Uuid>, store: &S) -> AppResult<SelectionDiff>
    where
        S: SelectionStore + ?Sized,
    {
        let diff = SelectionDiff::between(&self.persisted, &current);
        if diff.is_empty() {
            return Ok(diff);
        }

        let (user_id, entry_date) = (self.user_id, self.entry_date);
        let added: Vec<Uuid> = diff.added.iter().copied().collect();
        let removed: Vec<Uuid> = diff.removed.iter().copied().collect();

        let insert = async {
            if added.is_empty() {
                return Ok(());
            }
            store.add_attributes(user_id, entry_date, &added).await
        };
        let delete = async {
            if removed.is_empty() {
                return Ok(());
            }
            store.remove_attributes(user_id, entry_date, &removed).await
        };
        tokio::try_join!(insert, delete)?;

        tracing::debug!(
            user_id = %user_id,
            entry_date = %entry_date,
            added = diff.added.len(),
            removed = diff.removed.len(),
            "Daily selection synced"
        );

        self.persisted = current;
        Ok(diff)
    }
}
