//! Aggregations over a user's entries

use std::collections::HashMap;

use super::Store;
use crate::types::{CategoryTotal, DateRange, EntryKind, EntryStats};

impl Store {
    /// Income and expense totals within the range
    pub fn entry_stats(&self, user_id: &str, range: DateRange) -> EntryStats {
        let data = self.data.read();
        let (income, expense) = data
            .entries
            .iter()
            .filter(|e| e.user_id == user_id && range.contains(&e.date))
            .fold((0.0, 0.0), |(income, expense), e| match e.kind {
                EntryKind::Income => (income + e.amount, expense),
                EntryKind::Expense => (income, expense + e.amount),
            });

        EntryStats::new(income, expense)
    }

    /// Expense totals per category, largest first
    pub fn stats_by_category(&self, user_id: &str, range: DateRange) -> Vec<CategoryTotal> {
        let mut totals: HashMap<String, CategoryTotal> = HashMap::new();

        for entry in self.data.read().entries.iter().filter(|e| {
            e.user_id == user_id && e.kind == EntryKind::Expense && range.contains(&e.date)
        }) {
            let total = totals
                .entry(entry.category.clone())
                .or_insert_with(|| CategoryTotal {
                    category: entry.category.clone(),
                    total_amount: 0.0,
                    count: 0,
                });
            total.total_amount += entry.amount;
            total.count += 1;
        }

        let mut totals: Vec<CategoryTotal> = totals.into_values().collect();
        totals.sort_by(|a, b| {
            b.total_amount
                .partial_cmp(&a.total_amount)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.category.cmp(&b.category))
        });
        totals
    }
}
