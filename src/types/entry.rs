//! Financial entry types (income and expenses)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DateRange;

/// Whether an entry adds to or subtracts from the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Income,
    #[default]
    Expense,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Income => write!(f, "income"),
            EntryKind::Expense => write!(f, "expense"),
        }
    }
}

/// A stored income or expense record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub amount: f64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(rename = "type", default)]
    pub kind: EntryKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating an entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEntry {
    pub title: String,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to the creation time when omitted
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(rename = "type", default)]
    pub kind: EntryKind,
}

impl NewEntry {
    pub fn new(title: &str, amount: f64, category: &str, kind: EntryKind) -> Self {
        Self {
            title: title.to_string(),
            amount,
            category: category.to_string(),
            description: None,
            date: None,
            kind,
        }
    }

    pub fn on(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(rename = "type", default)]
    pub kind: Option<EntryKind>,
}

impl EntryUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.amount.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.kind.is_none()
    }
}

/// Query parameters for listing entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFilter {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Case-insensitive substring match on the category
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

fn default_limit() -> usize {
    100
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
            category: None,
            start_date: None,
            end_date: None,
        }
    }
}

impl ListFilter {
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    /// 1-based page number derived from skip/limit
    pub fn page(&self) -> usize {
        self.skip / self.limit.max(1) + 1
    }
}
