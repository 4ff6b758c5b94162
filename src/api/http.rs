//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderValue,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::rest::{auth, expenses};
use super::websocket::{handler::ws_handler, state::AppState};

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket endpoint
        .route("/ws/expenses", get(ws_handler))
        .route("/", get(root))
        .route("/health", get(health_check))
        // Accounts
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        // Entries
        .route(
            "/expenses",
            get(expenses::list_entries).post(expenses::create_entry),
        )
        .route("/expenses/stats/summary", get(expenses::stats_summary))
        .route("/expenses/stats/by-category", get(expenses::stats_by_category))
        .route(
            "/expenses/:id",
            get(expenses::get_entry)
                .put(expenses::update_entry)
                .delete(expenses::delete_entry),
        )
        .layer(cors_layer(&state.settings.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// An empty origin list allows any origin
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}

/// Service information
async fn root(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "message": state.settings.app_name,
        "version": crate::VERSION,
        "websocket": "/ws/expenses",
        "endpoints": {
            "auth": "/auth",
            "expenses": "/expenses"
        }
    }))
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": crate::VERSION,
        "connected_users": state.registry.user_count(),
        "connections": state.registry.total_connections(),
    }))
}
