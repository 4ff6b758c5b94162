//! Data types for the Finance Tracker server
//!
//! This module contains the user, entry and statistics structures shared by
//! the store, the REST surface and the real-time channel.

mod entry;
mod stats;
mod user;

pub use entry::{Entry, EntryKind, EntryUpdate, ListFilter, NewEntry};
pub use stats::{CategoryTotal, DateRange, EntryStats};
pub use user::{NewUser, User, UserIdentity, UserProfile};
