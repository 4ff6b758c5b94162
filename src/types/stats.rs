//! Aggregate statistics types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive date window; open ends match everything
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start_date: Option<DateTime<Utc>>, end_date: Option<DateTime<Utc>>) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    pub fn contains(&self, date: &DateTime<Utc>) -> bool {
        self.start_date.map_or(true, |start| *date >= start)
            && self.end_date.map_or(true, |end| *date <= end)
    }
}

/// Income/expense totals for a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryStats {
    pub income_total: f64,
    pub expense_total: f64,
    pub balance: f64,
}

impl EntryStats {
    pub fn new(income_total: f64, expense_total: f64) -> Self {
        Self {
            income_total,
            expense_total,
            balance: income_total - expense_total,
        }
    }
}

/// Expense total for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total_amount: f64,
    pub count: usize,
}
