//! WebSocket upgrade endpoint

use std::sync::Arc;

use axum::{
    extract::{ws::{WebSocket, WebSocketUpgrade}, Query, State},
    response::Response,
};
use futures::StreamExt;
use serde::Deserialize;

use super::session::run_session;
use super::state::AppState;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Bearer token; checked after the upgrade completes
    pub token: Option<String>,
}

/// WebSocket upgrade handler
///
/// The upgrade is always accepted; a missing or bad token is answered with
/// a 1008 close frame so browser clients can read the reason.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, params.token, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, token: Option<String>, state: Arc<AppState>) {
    let (sink, stream) = socket.split();
    let reason = run_session(&state.session, token, stream, sink).await;
    tracing::debug!(?reason, "WebSocket task finished");
}
