//! Entry CRUD operations
//!
//! Every operation is scoped to one user; entries owned by someone else
//! behave as if they did not exist.

use chrono::Utc;

use super::{Store, StoreError, StoreResult};
use crate::types::{Entry, EntryUpdate, ListFilter, NewEntry};
use crate::validation::{validate_entry_update, validate_new_entry};

/// Largest page a listing may request
pub const MAX_PAGE_SIZE: usize = 1000;

impl Store {
    /// Create an entry for a user
    pub fn create_entry(&self, user_id: &str, new_entry: NewEntry) -> StoreResult<Entry> {
        if let Some(msg) = validate_new_entry(&new_entry) {
            return Err(StoreError::Validation(msg));
        }

        let now = Utc::now();
        let entry = Entry {
            id: uuid::Uuid::new_v4().simple().to_string(),
            user_id: user_id.to_string(),
            title: new_entry.title,
            amount: new_entry.amount,
            category: new_entry.category,
            description: new_entry.description,
            date: new_entry.date.unwrap_or(now),
            kind: new_entry.kind,
            created_at: now,
            updated_at: now,
        };

        let mut data = self.data.write();
        let stored = entry.clone();
        self.commit(&mut data, |data| data.entries.push(stored))?;

        Ok(entry)
    }

    pub fn get_entry(&self, entry_id: &str, user_id: &str) -> Option<Entry> {
        self.data
            .read()
            .entries
            .iter()
            .find(|e| e.id == entry_id && e.user_id == user_id)
            .cloned()
    }

    /// List a user's entries, newest date first
    pub fn list_entries(&self, user_id: &str, filter: &ListFilter) -> StoreResult<Vec<Entry>> {
        if filter.limit == 0 || filter.limit > MAX_PAGE_SIZE {
            return Err(StoreError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let range = filter.range();
        let category = filter.category.as_deref().map(str::to_lowercase);

        let mut entries: Vec<Entry> = self
            .data
            .read()
            .entries
            .iter()
            .filter(|e| e.user_id == user_id && range.contains(&e.date))
            .filter(|e| match &category {
                Some(needle) => e.category.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .cloned()
            .collect();

        entries.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(entries
            .into_iter()
            .skip(filter.skip)
            .take(filter.limit)
            .collect())
    }

    /// Apply a partial update; None when the entry is not found
    pub fn update_entry(
        &self,
        entry_id: &str,
        user_id: &str,
        update: EntryUpdate,
    ) -> StoreResult<Option<Entry>> {
        if let Some(msg) = validate_entry_update(&update) {
            return Err(StoreError::Validation(msg));
        }

        let mut data = self.data.write();
        let Some(index) = data
            .entries
            .iter()
            .position(|e| e.id == entry_id && e.user_id == user_id)
        else {
            return Ok(None);
        };

        if update.is_empty() {
            return Ok(Some(data.entries[index].clone()));
        }

        let mut entry = data.entries[index].clone();
        if let Some(title) = update.title {
            entry.title = title;
        }
        if let Some(amount) = update.amount {
            entry.amount = amount;
        }
        if let Some(category) = update.category {
            entry.category = category;
        }
        if let Some(description) = update.description {
            entry.description = Some(description);
        }
        if let Some(date) = update.date {
            entry.date = date;
        }
        if let Some(kind) = update.kind {
            entry.kind = kind;
        }
        entry.updated_at = Utc::now();

        let updated = entry.clone();
        self.commit(&mut data, |data| data.entries[index] = entry)?;
        Ok(Some(updated))
    }

    /// Delete an entry; false when nothing matched
    pub fn delete_entry(&self, entry_id: &str, user_id: &str) -> StoreResult<bool> {
        let mut data = self.data.write();
        let Some(index) = data
            .entries
            .iter()
            .position(|e| e.id == entry_id && e.user_id == user_id)
        else {
            return Ok(false);
        };

        self.commit(&mut data, |data| {
            data.entries.remove(index);
        })?;
        Ok(true)
    }

    pub fn count_entries(&self, user_id: &str) -> usize {
        self.data
            .read()
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .count()
    }
}
