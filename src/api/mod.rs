//! API module for HTTP and WebSocket endpoints
//!
//! REST endpoints for accounts and entries, plus the WebSocket channel that
//! pushes entry changes to the owner's open connections.

pub mod http;
pub mod rest;
pub mod websocket;
