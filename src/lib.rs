//! Finance Tracker Server
//!
//! Backend for a personal finance tracker: users record income and expense
//! entries over REST and receive live updates over a WebSocket channel.
//!
//! # Modules
//!
//! - `config`: Environment-driven settings
//! - `types`: Users, entries and statistics
//! - `validation`: Field rules for incoming records
//! - `store`: In-memory entry store with JSON-lines persistence
//! - `auth`: Password hashing, JWT tokens, identity resolution
//! - `api`: REST endpoints and the real-time WebSocket channel
//! - `utils`: Atomic file writes
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use finance_tracker::{create_router, AppState, Settings, Store};
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = Settings::from_env().unwrap();
//!     let state = Arc::new(AppState::new(settings, Arc::new(Store::in_memory())));
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await.unwrap();
//!     axum::serve(listener, create_router(state)).await.unwrap();
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod store;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export commonly used items at crate root
pub use api::http::create_router;
pub use api::websocket::{AppState, ConnectionRegistry, Notifier};
pub use config::Settings;
pub use store::Store;
pub use types::{Entry, EntryKind, EntryStats, NewEntry, User, UserIdentity};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
