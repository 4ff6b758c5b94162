//! Entry endpoints
//!
//! Writes notify the owner's WebSocket connections once the store has
//! committed the change. Delivery runs on its own task so a slow client
//! never delays the HTTP response.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResult, CurrentUser};
use crate::api::websocket::state::AppState;
use crate::types::{CategoryTotal, DateRange, Entry, EntryStats, EntryUpdate, ListFilter, NewEntry};

/// Response for GET /expenses
#[derive(Debug, Serialize, Deserialize)]
pub struct EntryListResponse {
    pub expenses: Vec<Entry>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

/// GET /expenses
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<ListFilter>,
) -> ApiResult<Json<EntryListResponse>> {
    let expenses = state.store.list_entries(&user.id, &filter)?;

    Ok(Json(EntryListResponse {
        expenses,
        total: state.store.count_entries(&user.id),
        page: filter.page(),
        limit: filter.limit,
    }))
}

/// GET /expenses/:id
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(entry_id): Path<String>,
) -> ApiResult<Json<Entry>> {
    state
        .store
        .get_entry(&entry_id, &user.id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Expense not found"))
}

/// POST /expenses
pub async fn create_entry(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(new_entry): Json<NewEntry>,
) -> ApiResult<impl IntoResponse> {
    let entry = state.store.create_entry(&user.id, new_entry)?;

    let notifier = state.notifier.clone();
    let notified = entry.clone();
    tokio::spawn(async move {
        notifier.entry_created(&notified.user_id, &notified).await;
    });

    Ok((StatusCode::CREATED, Json(entry)))
}

/// PUT /expenses/:id
pub async fn update_entry(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(entry_id): Path<String>,
    Json(update): Json<EntryUpdate>,
) -> ApiResult<Json<Entry>> {
    let entry = state
        .store
        .update_entry(&entry_id, &user.id, update)?
        .ok_or_else(|| ApiError::not_found("Expense not found"))?;

    let notifier = state.notifier.clone();
    let notified = entry.clone();
    tokio::spawn(async move {
        notifier
            .entry_changed(&notified.user_id, &notified, "updated")
            .await;
    });

    Ok(Json(entry))
}

/// DELETE /expenses/:id
pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(entry_id): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.store.delete_entry(&entry_id, &user.id)? {
        return Err(ApiError::not_found("Expense not found"));
    }

    let notifier = state.notifier.clone();
    tokio::spawn(async move {
        notifier.entry_deleted(&user.id, &entry_id).await;
    });

    Ok(StatusCode::NO_CONTENT)
}

/// GET /expenses/stats/summary
pub async fn stats_summary(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(range): Query<DateRange>,
) -> Json<EntryStats> {
    Json(state.store.entry_stats(&user.id, range))
}

/// GET /expenses/stats/by-category
pub async fn stats_by_category(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(range): Query<DateRange>,
) -> Json<Vec<CategoryTotal>> {
    Json(state.store.stats_by_category(&user.id, range))
}
