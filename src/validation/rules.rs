//! Length and range rules for incoming records

use crate::types::{EntryUpdate, NewEntry, NewUser};

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_CATEGORY_LEN: usize = 50;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MIN_PASSWORD_LEN: usize = 6;
/// bcrypt only looks at the first 72 bytes
pub const MAX_PASSWORD_LEN: usize = 72;

fn check_len(field: &str, value: &str, max: usize) -> Option<String> {
    let len = value.chars().count();
    if len == 0 {
        Some(format!("{} must not be empty", field))
    } else if len > max {
        Some(format!("{} must be at most {} characters", field, max))
    } else {
        None
    }
}

fn check_amount(amount: f64) -> Option<String> {
    if amount.is_finite() && amount > 0.0 {
        None
    } else {
        Some("amount must be greater than 0".to_string())
    }
}

fn check_description(description: Option<&str>) -> Option<String> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Some(format!(
            "description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        )),
        _ => None,
    }
}

/// Validate a new entry
pub fn validate_new_entry(entry: &NewEntry) -> Option<String> {
    check_len("title", &entry.title, MAX_TITLE_LEN)
        .or_else(|| check_amount(entry.amount))
        .or_else(|| check_len("category", &entry.category, MAX_CATEGORY_LEN))
        .or_else(|| check_description(entry.description.as_deref()))
}

/// Validate only the fields present in a partial update
pub fn validate_entry_update(update: &EntryUpdate) -> Option<String> {
    update
        .title
        .as_deref()
        .and_then(|t| check_len("title", t, MAX_TITLE_LEN))
        .or_else(|| update.amount.and_then(check_amount))
        .or_else(|| {
            update
                .category
                .as_deref()
                .and_then(|c| check_len("category", c, MAX_CATEGORY_LEN))
        })
        .or_else(|| check_description(update.description.as_deref()))
}

/// Validate a registration request
pub fn validate_new_user(user: &NewUser) -> Option<String> {
    let email = user.email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => return Some("email is not a valid address".to_string()),
    }

    let password_len = user.password.chars().count();
    if password_len < MIN_PASSWORD_LEN || password_len > MAX_PASSWORD_LEN {
        return Some(format!(
            "password must be between {} and {} characters",
            MIN_PASSWORD_LEN, MAX_PASSWORD_LEN
        ));
    }

    match user.income {
        Some(income) if !(income >= 0.0) => Some("income must not be negative".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntryKind;

    #[test]
    fn test_valid_entry_passes() {
        let entry = NewEntry::new("Lunch", 25.5, "Food", EntryKind::Expense);
        assert!(validate_new_entry(&entry).is_none());
    }

    #[test]
    fn test_entry_rejects_non_positive_amount() {
        let entry = NewEntry::new("Lunch", 0.0, "Food", EntryKind::Expense);
        let error = validate_new_entry(&entry);
        assert!(error.unwrap().contains("amount"));
    }

    #[test]
    fn test_entry_rejects_long_title() {
        let entry = NewEntry::new(&"x".repeat(101), 1.0, "Food", EntryKind::Expense);
        assert!(validate_new_entry(&entry).unwrap().contains("title"));
    }

    #[test]
    fn test_update_checks_only_present_fields() {
        assert!(validate_entry_update(&EntryUpdate::default()).is_none());

        let update = EntryUpdate {
            category: Some(String::new()),
            ..Default::default()
        };
        assert!(validate_entry_update(&update).unwrap().contains("category"));
    }

    #[test]
    fn test_user_validation() {
        assert!(validate_new_user(&NewUser::new("ana@example.com", "secret1")).is_none());
        assert!(validate_new_user(&NewUser::new("not-an-email", "secret1")).is_some());
        assert!(validate_new_user(&NewUser::new("ana@example.com", "123")).is_some());

        let mut user = NewUser::new("ana@example.com", "secret1");
        user.income = Some(-1.0);
        assert!(validate_new_user(&user).is_some());
    }
}
