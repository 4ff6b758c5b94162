//! Field validation for users and entries
//!
//! Each check returns `Some(message)` describing the first violated rule.

mod rules;

pub use rules::{
    validate_entry_update, validate_new_entry, validate_new_user, MAX_CATEGORY_LEN,
    MAX_DESCRIPTION_LEN, MAX_PASSWORD_LEN, MAX_TITLE_LEN, MIN_PASSWORD_LEN,
};
