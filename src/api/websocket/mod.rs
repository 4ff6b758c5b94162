//! WebSocket module for real-time entry updates
//!
//! Provides the endpoint at `/ws/expenses?token=<jwt>`. After the token is
//! resolved the connection joins its user's bucket in the
//! [`ConnectionRegistry`] and receives every event broadcast to that user.
//!
//! ## Frames
//! - Client: `{"type":"ping","timestamp":...}`, `{"type":"get_stats"}`
//! - Server: `{"type":<event>,"payload":{...}}` for `connection`, `pong`,
//!   `stats`, `error`, `new_expense`, `expense_<action>`, `expense_deleted`

pub mod events;
pub mod handler;
pub mod notify;
pub mod registry;
pub mod session;
pub mod state;

// Re-export commonly used items
pub use notify::Notifier;
pub use registry::{ConnectionHandle, ConnectionId, ConnectionRegistry};
pub use session::{run_session, ExitReason, SessionContext, SessionState};
pub use state::AppState;
